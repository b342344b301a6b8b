//! Block splitter (spec §4.3): locates row boundaries (LF, CRLF, or bare
//! CR) within a UTF-8 block, carrying an incomplete trailing row over to
//! the next block.

/// A complete row's bytes, with its absolute byte offset in the overall
/// stream for error reporting (spec §7: "byte offset ... when available").
#[derive(Debug, Clone)]
pub struct Row {
    pub bytes: Vec<u8>,
    pub byte_offset: u64,
}

#[derive(Default)]
pub struct BlockSplitter {
    carry: Vec<u8>,
    carry_offset: u64,
    stream_offset: u64,
}

impl BlockSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split a (already transcoded) block into complete rows. The last,
    /// possibly-incomplete row is retained internally. When `eof` is true
    /// any nonempty carry is flushed as a final row.
    pub fn split_block(&mut self, block: &[u8], eof: bool) -> Vec<Row> {
        self.stream_offset += block.len() as u64;

        let mut combined = std::mem::take(&mut self.carry);
        let combined_start = self.carry_offset;
        combined.extend_from_slice(block);

        let mut rows = Vec::new();
        let mut row_start = 0usize;
        let mut i = 0usize;
        while i < combined.len() {
            match combined[i] {
                b'\n' => {
                    rows.push(make_row(&combined, row_start, i, combined_start));
                    i += 1;
                    row_start = i;
                }
                b'\r' if i + 1 == combined.len() && !eof => {
                    // A lone trailing `\r` at the end of a non-final block is
                    // ambiguous: the next block might start with `\n`, which
                    // would make this a single CRLF terminator rather than a
                    // bare CR. Stop scanning and let it carry over uninterpreted.
                    break;
                }
                b'\r' => {
                    let terminator_len = if combined.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    rows.push(make_row(&combined, row_start, i, combined_start));
                    i += terminator_len;
                    row_start = i;
                }
                _ => i += 1,
            }
        }

        if row_start < combined.len() {
            if eof {
                rows.push(make_row(&combined, row_start, combined.len(), combined_start));
            } else {
                self.carry = combined[row_start..].to_vec();
                self.carry_offset = combined_start + row_start as u64;
            }
        }

        rows
    }
}

fn make_row(combined: &[u8], start: usize, end: usize, combined_start: u64) -> Row {
    Row {
        bytes: combined[start..end].to_vec(),
        byte_offset: combined_start + start as u64,
    }
}
