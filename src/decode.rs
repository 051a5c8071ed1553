//! Incremental UTF-8 decoding for chunked byte streams.
//!
//! Transport reads do not respect character boundaries, so a multi-byte
//! character can arrive split across two reads. `Utf8Decoder` holds the
//! incomplete tail back until the rest of the sequence arrives.

/// Stateful decoder, one per stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next read.
    ///
    /// Returns every complete character available so far. An incomplete
    /// sequence at the end is kept for the next call; invalid bytes are
    /// replaced with U+FFFD.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, invalid) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &invalid[len..];
                        }
                        // Incomplete sequence at the end: wait for more bytes
                        None => {
                            rest = invalid;
                            break;
                        }
                    }
                }
            }
        }

        let held = rest.len();
        let consumed = self.pending.len() - held;
        self.pending.drain(..consumed);
        out
    }

    /// Flush at end of stream. A truncated trailing sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&tail).into_owned()
    }

    /// Whether bytes are being held back waiting for the rest of a character.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
