//! Message framing over an unstructured byte stream.
//!
//! There is no length prefix. A message is complete when either the 4-byte
//! terminator appears, or the buffer holds a structurally balanced top-level
//! JSON object. The JSON fallback exists because large upload envelopes may
//! legitimately contain terminator-looking bytes inside their base64 payload,
//! or arrive without any explicit terminator at all.

use anyhow::{bail, Result};

use crate::protocol::TERMINATOR;

/// Append-only accumulator for one request or response.
///
/// Owned exclusively by the connection that feeds it; fed after every read,
/// then asked whether a full message has arrived.
#[derive(Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Check whether the accumulated bytes form a complete message.
    ///
    /// Returns the decoded message body on completion, `Ok(None)` when more
    /// bytes are needed. The two completion conditions, in order:
    ///
    /// 1. The buffer contains the terminator. The body is everything before
    ///    the first occurrence; a body that is not valid UTF-8 at this point
    ///    is a protocol error, not something more reads can fix.
    /// 2. The buffer decodes as text and the span from the first `{` through
    ///    the last `}` parses as JSON. Not-yet-valid UTF-8 (a split multibyte
    ///    sequence) just means the message is still incomplete here.
    pub fn try_complete(&self) -> Result<Option<String>> {
        if let Some(pos) = find_terminator(&self.buf) {
            let body = match std::str::from_utf8(&self.buf[..pos]) {
                Ok(s) => s,
                Err(e) => bail!("message is not valid UTF-8: {e}"),
            };
            return Ok(Some(body.to_string()));
        }

        let Ok(text) = std::str::from_utf8(&self.buf) else {
            return Ok(None);
        };
        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if end > start && serde_json::from_str::<serde_json::Value>(&text[start..=end]).is_ok()
            {
                return Ok(Some(text.to_string()));
            }
        }
        Ok(None)
    }
}

fn find_terminator(buf: &[u8]) -> Option<usize> {
    buf.windows(TERMINATOR.len())
        .position(|w| w == TERMINATOR)
}

/// Stamp the terminator onto outgoing text if it is not already there.
/// Applied to requests (client to server) and responses (server to client).
pub fn terminated(mut text: String) -> String {
    if !text.ends_with("\r\n\r\n") {
        text.push_str("\r\n\r\n");
    }
    text
}

/// Drop the terminator and anything after it from received text.
pub fn strip_terminator(text: &str) -> &str {
    match text.find("\r\n\r\n") {
        Some(pos) => &text[..pos],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn plain_command_completes_on_terminator() {
        let mut fb = FrameBuffer::new();
        fb.extend(b"LIST");
        assert!(fb.try_complete().unwrap().is_none());
        fb.extend(b"\r\n\r\n");
        assert_eq!(fb.try_complete().unwrap().as_deref(), Some("LIST"));
    }

    #[test]
    fn body_excludes_terminator_and_trailing_bytes() {
        let mut fb = FrameBuffer::new();
        fb.extend(b"GET a.txt\r\n\r\ngarbage");
        assert_eq!(fb.try_complete().unwrap().as_deref(), Some("GET a.txt"));
    }

    #[test]
    fn json_balance_completes_without_terminator() {
        let mut fb = FrameBuffer::new();
        fb.extend(br#"{"command":"upload","filename":"a.txt","filedata":"SGVsbG8="}"#);
        let msg = fb.try_complete().unwrap().unwrap();
        assert!(msg.starts_with('{'));
    }

    #[test]
    fn partial_json_keeps_reading() {
        let mut fb = FrameBuffer::new();
        fb.extend(br#"{"command":"upload","filename":"a.txt","filedata":"SGV"#);
        assert!(fb.try_complete().unwrap().is_none());
        fb.extend(br#"sbG8="}"#);
        assert!(fb.try_complete().unwrap().is_some());
    }

    #[test]
    fn terminator_bytes_inside_json_payload_still_frame() {
        // A payload whose base64 text happens to contain \r\n\r\n must not
        // split the message; the encoded form is what travels on the wire.
        let payload = b"\r\n\r\nbinary\r\n\r\n";
        let encoded = base64::engine::general_purpose::STANDARD.encode(payload);
        let envelope =
            format!(r#"{{"command":"upload","filename":"b.bin","filedata":"{encoded}"}}"#);
        let mut fb = FrameBuffer::new();
        fb.extend(envelope.as_bytes());
        assert_eq!(fb.try_complete().unwrap().as_deref(), Some(envelope.as_str()));
    }

    #[test]
    fn split_multibyte_utf8_is_incomplete_not_error() {
        let text = "{\"command\":\"upload\",\"filename\":\"péché.txt\"";
        let bytes = text.as_bytes();
        let mut fb = FrameBuffer::new();
        // Cut in the middle of the two-byte 'é'
        fb.extend(&bytes[..bytes.len() - 6]);
        assert!(fb.try_complete().unwrap().is_none());
    }

    #[test]
    fn invalid_utf8_before_terminator_is_protocol_error() {
        let mut fb = FrameBuffer::new();
        fb.extend(&[0xff, 0xfe, b'\r', b'\n', b'\r', b'\n']);
        assert!(fb.try_complete().is_err());
    }

    #[test]
    fn terminated_is_idempotent() {
        assert_eq!(terminated("LIST".into()), "LIST\r\n\r\n");
        assert_eq!(terminated("LIST\r\n\r\n".into()), "LIST\r\n\r\n");
    }

    #[test]
    fn strip_terminator_splits_off_trailing_data() {
        assert_eq!(strip_terminator("{\"status\":\"OK\"}\r\n\r\nxx"), "{\"status\":\"OK\"}");
        assert_eq!(strip_terminator("LIST"), "LIST");
    }
}
