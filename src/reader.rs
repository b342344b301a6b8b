//! `read_fwf` wires the coordinator to a caller-supplied byte buffer or file
//! path and returns a finished [`RecordBatch`].

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use bytes::Bytes;

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::options::{ConvertOptions, ParseOptions, ReadOptions};
use crate::source::{FileSource, SliceSource};

/// Where `read_fwf` draws its bytes from.
pub enum FwfSource {
    Bytes(Bytes),
    File(PathBuf),
}

impl FwfSource {
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        FwfSource::Bytes(data.into())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        FwfSource::File(path.as_ref().to_path_buf())
    }
}

/// Parses a fixed-width byte stream into a columnar, typed, nullable table.
///
/// `read_options` and `convert_options` default when omitted.
pub fn read_fwf(
    source: FwfSource,
    parse_options: ParseOptions,
    read_options: Option<ReadOptions>,
    convert_options: Option<ConvertOptions>,
) -> Result<RecordBatch> {
    let read_options = read_options.unwrap_or_default();
    let convert_options = convert_options.unwrap_or_default();
    let coordinator = Coordinator::new(parse_options, read_options, convert_options);

    match source {
        FwfSource::Bytes(data) => coordinator.run(SliceSource::new(data)),
        FwfSource::File(path) => coordinator.run(FileSource::open(path)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_fwf_applies_defaults_when_options_are_absent() {
        let parse_options = ParseOptions::try_new(vec![2, 3, 1]).unwrap();
        let batch = read_fwf(
            FwfSource::from_bytes(&b"abcdef"[..]),
            parse_options,
            None,
            None,
        )
        .unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 3);
    }
}
