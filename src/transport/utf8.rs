//! Incremental UTF-8 decoding of a chunked body.
//!
//! Network chunks can split a multi-byte sequence anywhere. The decoder
//! keeps the incomplete tail of one chunk and prepends it to the next.

/// Streaming UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Bytes of an incomplete sequence carried over from the last chunk.
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with no carried-over bytes.
    pub const fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Decode one chunk.
    ///
    /// Invalid bytes become U+FFFD. A sequence cut off at the end of the
    /// chunk is held back until the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;

        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                }
                Err(err) => {
                    let valid_end = start + err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));

                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more.
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush at end of stream.
    ///
    /// A dangling partial sequence can never complete, so it becomes a
    /// single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    /// Check if bytes are being held for the next chunk.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
