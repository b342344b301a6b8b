//! Maps a block's input bytes through a named codepage to UTF-8, preserving
//! a carry tail of incomplete characters across calls and applying the
//! `,swaplfnl` newline modifier.

use snafu::ensure;

use crate::ebcdic;
use crate::error::{BufferTooSmallSnafu, Result, UnknownEncodingSnafu};
use crate::options::EncodingSpec;

enum Codepage {
    Utf8Passthrough,
    Unicode(&'static encoding_rs::Encoding),
    Ebcdic(&'static ebcdic::Table),
}

pub struct Transcoder {
    codepage: Codepage,
    swaplfnl: bool,
    /// Unicode-family decode state (carries partial multibyte sequences
    /// across block boundaries internally).
    decoder: Option<encoding_rs::Decoder>,
    /// Trailing bytes of a UTF-8 passthrough block that did not form a
    /// complete character; held for the next call.
    passthrough_carry: Vec<u8>,
}

impl Transcoder {
    pub fn try_new(spec: &EncodingSpec) -> Result<Self> {
        if spec.is_utf8_passthrough() {
            return Ok(Self {
                codepage: Codepage::Utf8Passthrough,
                swaplfnl: spec.swaplfnl,
                decoder: None,
                passthrough_carry: Vec::new(),
            });
        }
        if let Some(table) = ebcdic::lookup(&spec.codepage) {
            return Ok(Self {
                codepage: Codepage::Ebcdic(table),
                swaplfnl: spec.swaplfnl,
                decoder: None,
                passthrough_carry: Vec::new(),
            });
        }
        if let Some(encoding) = encoding_rs::Encoding::for_label(spec.codepage.as_bytes()) {
            return Ok(Self {
                decoder: Some(encoding.new_decoder()),
                codepage: Codepage::Unicode(encoding),
                swaplfnl: spec.swaplfnl,
                passthrough_carry: Vec::new(),
            });
        }
        UnknownEncodingSnafu {
            name: spec.codepage.clone(),
        }
        .fail()
    }

    /// Transcode one block of input to UTF-8. `eof` tells the decoder
    /// whether more input may follow (needed so Unicode multibyte decoders
    /// know whether a trailing partial sequence is an error or a carry).
    pub fn transcode_block(
        &mut self,
        input: &[u8],
        eof: bool,
        buffer_safety_factor: f64,
        block_size: usize,
    ) -> Result<Vec<u8>> {
        match self.codepage {
            Codepage::Utf8Passthrough => Ok(self.passthrough(input, eof)),
            Codepage::Ebcdic(table) => Ok(self.decode_single_byte(input, table)),
            Codepage::Unicode(_) => self.decode_unicode(input, eof, buffer_safety_factor, block_size),
        }
    }

    fn passthrough(&mut self, input: &[u8], eof: bool) -> Vec<u8> {
        let mut combined = std::mem::take(&mut self.passthrough_carry);
        combined.extend_from_slice(input);

        let valid_up_to = match std::str::from_utf8(&combined) {
            Ok(_) => combined.len(),
            Err(e) => e.valid_up_to(),
        };

        if eof {
            // No more input is coming; whatever didn't validate is passed
            // through as-is rather than silently dropped.
            return combined;
        }

        self.passthrough_carry = combined.split_off(valid_up_to);
        combined
    }

    fn decode_single_byte(&self, input: &[u8], table: &'static ebcdic::Table) -> Vec<u8> {
        let mut out = String::with_capacity(input.len());
        for &byte in input {
            let ch = if self.swaplfnl && byte == table.newline_byte {
                '\n'
            } else {
                table.decode_byte(byte)
            };
            out.push(ch);
        }
        out.into_bytes()
    }

    /// `decode_to_utf8` only promises to consume as much of `input` as fits
    /// in the destination it's given; on `OutputFull` the idiomatic
    /// `encoding_rs` continuation is to call it again with the *remaining*
    /// unconsumed input and a fresh buffer, never by resending
    /// already-consumed bytes into the same stateful decoder a second time
    /// (that would replay them). This loop is that continuation: it starts
    /// from a buffer sized `buffer_safety_factor * block_size` (spec §4.2's
    /// "reserves an output buffer sized buffer_safety_factor × block_size")
    /// and, on `OutputFull`, grows it geometrically up to a generous cap
    /// before falling back to repeated same-size attempts. Each attempt
    /// still makes forward progress as long as at least one character fits,
    /// so a large block just takes more iterations rather than failing.
    /// Only a buffer too small to hold even a single decoded character at
    /// the cap is a genuine `BufferTooSmall` (spec §7: "... or surface");
    /// that can't happen at this cap since the UTF-8 encoding of any single
    /// `char` is at most 4 bytes.
    fn decode_unicode(
        &mut self,
        input: &[u8],
        eof: bool,
        buffer_safety_factor: f64,
        block_size: usize,
    ) -> Result<Vec<u8>> {
        let decoder = self
            .decoder
            .as_mut()
            .expect("unicode codepage always has a decoder");

        let mut capacity = (((block_size as f64) * buffer_safety_factor).ceil() as usize).max(block_size);
        let max_capacity = capacity.saturating_mul(1024).max(1 << 20);

        let mut out = Vec::with_capacity(capacity);
        let mut consumed = 0usize;
        loop {
            let mut scratch = vec![0u8; capacity];
            let (result, read, written, _had_errors) =
                decoder.decode_to_utf8(&input[consumed..], &mut scratch, eof);
            scratch.truncate(written);
            out.extend_from_slice(&scratch);
            consumed += read;

            match result {
                encoding_rs::CoderResult::InputEmpty => break,
                encoding_rs::CoderResult::OutputFull => {
                    if capacity < max_capacity {
                        capacity = (capacity * 2).min(max_capacity);
                    } else {
                        ensure!(
                            read > 0,
                            BufferTooSmallSnafu {
                                safety_factor: buffer_safety_factor,
                                block_size,
                            }
                        );
                    }
                }
            }
        }

        if self.swaplfnl {
            swap_nel_for_lf(&mut out);
        }
        Ok(out)
    }
}

/// Replaces the Unicode NEL control character (U+0085), the conventional
/// "native newline" for several legacy single- and double-byte codepages,
/// with ASCII LF in-place on the decoded UTF-8 buffer.
fn swap_nel_for_lf(buf: &mut Vec<u8>) {
    const NEL_UTF8: [u8; 2] = [0xC2, 0x85];
    if !buf.windows(2).any(|w| w == NEL_UTF8) {
        return;
    }
    let mut result = Vec::with_capacity(buf.len());
    let mut i = 0;
    while i < buf.len() {
        if buf[i..].starts_with(&NEL_UTF8) {
            result.push(b'\n');
            i += 2;
        } else {
            result.push(buf[i]);
            i += 1;
        }
    }
    *buf = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passthrough_round_trips_ascii() {
        let spec = EncodingSpec::parse("");
        let mut transcoder = Transcoder::try_new(&spec).unwrap();
        let out = transcoder
            .transcode_block(b"hello\r\nworld", true, 2.0, 4096)
            .unwrap();
        assert_eq!(out, b"hello\r\nworld");
    }

    #[test]
    fn ebcdic_decodes_digits_and_letters() {
        let spec = EncodingSpec::parse("cp1047");
        let mut transcoder = Transcoder::try_new(&spec).unwrap();
        // 'A' = 0xC1, '1' = 0xF1 in CP1047.
        let out = transcoder
            .transcode_block(&[0xC1, 0xF1], true, 2.0, 4096)
            .unwrap();
        assert_eq!(out, b"A1");
    }

    #[test]
    fn ebcdic_swaplfnl_maps_native_newline_to_lf() {
        let spec = EncodingSpec::parse("cp1047,swaplfnl");
        let mut transcoder = Transcoder::try_new(&spec).unwrap();
        let out = transcoder.transcode_block(&[0xC1, 0x25], true, 2.0, 4096).unwrap();
        assert_eq!(out, b"A\n");
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let spec = EncodingSpec::parse("not-a-real-codepage");
        assert!(Transcoder::try_new(&spec).is_err());
    }

    #[test]
    fn big5_round_trips_through_encoding_rs() {
        let spec = EncodingSpec::parse("Big5");
        let mut transcoder = Transcoder::try_new(&spec).unwrap();
        // Big5-encoded ASCII digits are identical to their ASCII bytes.
        let out = transcoder.transcode_block(b"12345", true, 2.0, 4096).unwrap();
        assert_eq!(out, b"12345");
    }

    #[test]
    fn an_initially_undersized_buffer_still_decodes_correctly_via_internal_growth() {
        let spec = EncodingSpec::parse("windows-1252");
        let mut transcoder = Transcoder::try_new(&spec).unwrap();
        // 0x80 is the euro sign in windows-1252, which expands to 3 UTF-8
        // bytes; sixteen of them need 48 bytes against a 4-byte starting
        // buffer (factor 1.0, block_size 4), forcing several internal
        // grow-and-continue iterations (spec §4.2: "the block is
        // re-processed with a larger factor").
        let input = [0x80u8; 16];
        let out = transcoder.transcode_block(&input, true, 1.0, 4).unwrap();
        assert_eq!(out, "€".repeat(16).as_bytes());
    }

    #[test]
    fn sufficiently_large_buffer_decodes_the_same_expanding_input() {
        let spec = EncodingSpec::parse("windows-1252");
        let mut transcoder = Transcoder::try_new(&spec).unwrap();
        let input = [0x80u8; 4];
        let out = transcoder.transcode_block(&input, false, 4.0, 4).unwrap();
        assert_eq!(out, "€€€€".as_bytes());
    }
}
