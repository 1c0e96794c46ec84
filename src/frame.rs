//! Record framing over a raw byte stream.
//!
//! Inbound records are concatenated JSON objects with no delimiter and
//! no whitespace sensitivity. The extractor scans for the first `{`,
//! tracks brace depth while respecting quoted strings and backslash
//! escapes, and yields the enclosing bytes once depth returns to zero.
//! Incomplete records stay buffered until more bytes arrive; whatever
//! is still buffered at end-of-stream is discarded by dropping the
//! extractor.

#[derive(Debug, Default)]
pub struct FrameExtractor {
    buf: Vec<u8>,
}

impl FrameExtractor {
    pub fn new() -> Self {
        FrameExtractor::default()
    }

    /// Append raw bytes from the transport.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Extract the next complete record, if any. Bytes preceding the
    /// record's opening brace are dropped along with it.
    pub fn next_record(&mut self) -> Option<Vec<u8>> {
        let start = self.buf.iter().position(|&b| b == b'{')?;

        let mut depth = 0usize;
        let mut in_str = false;
        let mut escaped = false;

        for i in start..self.buf.len() {
            let b = self.buf[i];

            if in_str {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_str = false;
                }
                continue;
            }

            match b {
                b'"' => in_str = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        let record = self.buf[start..=i].to_vec();
                        self.buf.drain(..=i);
                        return Some(record);
                    }
                }
                _ => {}
            }
        }

        None
    }

    /// Bytes currently buffered (including any unframed prefix).
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}
