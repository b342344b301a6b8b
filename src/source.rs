//! Byte source adapter (spec §4.1): a uniform view over an in-memory buffer
//! or a file, handing back contiguous block-sized reads.

use std::fs::File;
use std::io::{BufReader, Read};

use bytes::Bytes;
use snafu::ResultExt;

use crate::error::{IoErrorSnafu, Result};

/// Supplies contiguous block-sized reads with an end-of-stream flag.
pub trait ByteSource {
    /// Read up to `max_bytes`. Returns fewer bytes than requested only at
    /// end of stream, in which case the returned `eof` is `true`.
    fn read_block(&mut self, max_bytes: usize) -> Result<(Bytes, bool)>;
}

/// Source over an in-memory buffer; the common case for already-loaded
/// payloads and for tests.
pub struct SliceSource {
    data: Bytes,
    position: usize,
}

impl SliceSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }
}

impl ByteSource for SliceSource {
    fn read_block(&mut self, max_bytes: usize) -> Result<(Bytes, bool)> {
        let end = (self.position + max_bytes).min(self.data.len());
        let block = self.data.slice(self.position..end);
        self.position = end;
        let eof = self.position >= self.data.len();
        Ok((block, eof))
    }
}

/// Source over a file descriptor, read sequentially through a `BufReader`.
pub struct FileSource {
    reader: BufReader<File>,
}

impl FileSource {
    pub fn new(file: File) -> Self {
        Self {
            reader: BufReader::new(file),
        }
    }

    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let file = File::open(path).context(IoErrorSnafu)?;
        Ok(Self::new(file))
    }
}

impl ByteSource for FileSource {
    fn read_block(&mut self, max_bytes: usize) -> Result<(Bytes, bool)> {
        let mut buf = vec![0u8; max_bytes];
        let mut filled = 0;
        while filled < max_bytes {
            let n = self.reader.read(&mut buf[filled..]).context(IoErrorSnafu)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        let eof = filled < max_bytes;
        Ok((Bytes::from(buf), eof))
    }
}
