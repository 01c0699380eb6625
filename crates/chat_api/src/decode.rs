/// Incremental UTF-8 decoder for streamed reply bytes.
///
/// A multi-byte sequence split across chunk boundaries is held back until the
/// bytes that complete it arrive. Invalid bytes decode to U+FFFD.
#[derive(Debug, Default)]
pub struct StreamTextDecoder {
    pending: Vec<u8>,
}

impl StreamTextDecoder {
    /// Feed arbitrary bytes into the decoder and drain the decodable prefix.
    pub fn feed(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut decoded = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    decoded.push_str(text);
                    self.pending.clear();
                    return decoded;
                }
                Err(error) => {
                    let valid_up_to = error.valid_up_to();
                    decoded.push_str(&String::from_utf8_lossy(&self.pending[..valid_up_to]));

                    match error.error_len() {
                        // Truncated sequence at the buffer tail: wait for the
                        // next chunk to complete it.
                        None => {
                            self.pending.drain(..valid_up_to);
                            return decoded;
                        }
                        Some(invalid_len) => {
                            decoded.push('\u{FFFD}');
                            self.pending.drain(..valid_up_to + invalid_len);
                        }
                    }
                }
            }
        }
    }

    /// Flush the decoder at end of stream.
    ///
    /// A dangling partial sequence decodes to a single U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }

        self.pending.clear();
        '\u{FFFD}'.to_string()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
