//! Incremental scanner for `data:`-framed SSE records.
//!
//! The providers all frame their streams as newline-delimited records,
//! each either blank or prefixed `data:`. Bytes are buffered until a
//! newline arrives, so a multi-byte UTF-8 character split across two
//! transport chunks is reassembled before decoding.

/// Scans raw bytes into the payloads of complete `data:` records.
pub(crate) struct SseRecords {
    buf: Vec<u8>,
}

impl SseRecords {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed a chunk of bytes and return the payload of every complete
    /// `data:` record it finished. Blank lines and non-`data:` fields
    /// (comments, `event:`, `id:`, `retry:`) are skipped.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut payloads = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // the newline itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }

        payloads
    }

    /// Flush any unterminated final line once the transport closes.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.buf);
        data_payload(&line)
    }
}

/// Extract the payload of a `data:` line, stripping the optional
/// leading space per the SSE spec. `None` for anything else.
fn data_payload(line: &[u8]) -> Option<String> {
    if line.is_empty() {
        return None;
    }
    let text = String::from_utf8_lossy(line);
    let rest = text.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest).to_string())
}
