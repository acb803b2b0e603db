//! Text transcoding for `TYPE A` transfers.
//!
//! Bytes are decoded as UTF-8 and re-encoded. A multi-byte sequence split
//! across two chunks is carried over to the next call; invalid bytes become
//! U+FFFD.

const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

/// Set by `TYPE`. Only `Ascii` transcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Binary,
    Ascii,
}

pub struct TextCodec {
    carry: [u8; 3],
    carry_len: usize,
    scratch: Vec<u8>,
    out: Vec<u8>,
}

impl TextCodec {
    /// Buffers are sized for chunks of up to `chunk` bytes.
    pub fn new(chunk: usize) -> Self {
        Self {
            carry: [0; 3],
            carry_len: 0,
            scratch: Vec::with_capacity(chunk + 3),
            out: Vec::with_capacity(chunk * 3 + 3),
        }
    }

    pub fn transcode(&mut self, input: &[u8]) -> &[u8] {
        self.out.clear();
        self.scratch.clear();
        self.scratch.extend_from_slice(&self.carry[..self.carry_len]);
        self.scratch.extend_from_slice(input);
        self.carry_len = 0;

        let mut rest = &self.scratch[..];
        loop {
            match std::str::from_utf8(rest) {
                Ok(_) => {
                    self.out.extend_from_slice(rest);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    self.out.extend_from_slice(valid);
                    match e.error_len() {
                        Some(len) => {
                            self.out.extend_from_slice(REPLACEMENT);
                            rest = &after[len..];
                        }
                        None => {
                            // Truncated sequence at the end of the chunk.
                            self.carry[..after.len()].copy_from_slice(after);
                            self.carry_len = after.len();
                            break;
                        }
                    }
                }
            }
        }
        &self.out
    }

    /// Ends the stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> &[u8] {
        self.out.clear();
        if self.carry_len > 0 {
            self.out.extend_from_slice(REPLACEMENT);
            self.carry_len = 0;
        }
        &self.out
    }

    pub fn reset(&mut self) {
        self.carry_len = 0;
        self.out.clear();
        self.scratch.clear();
    }
}
