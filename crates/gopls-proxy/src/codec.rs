//! `Content-Length` framing for JSON-RPC messages.
//!
//! The same codec is used on the editor side and the gopls side. Messages are
//! kept as [`serde_json::Value`] so traffic the proxy does not understand is
//! forwarded byte-for-byte equivalent.

use serde_json::Value;
use thiserror::Error;
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

const CONTENT_LENGTH: &str = "content-length";

/// Errors produced while framing messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying stream failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// A header block did not carry a usable `Content-Length`.
    #[error("invalid message header: {0}")]
    InvalidHeader(String),

    /// The message body was not valid JSON.
    #[error("invalid message body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

/// Decodes and encodes `Content-Length` framed JSON values.
#[derive(Debug, Default)]
pub struct LspCodec {
    /// Body length of the frame currently being read, once its header is consumed.
    pending: Option<usize>,
}

impl LspCodec {
    /// Creates a codec with no partially read frame.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LspCodec {
    type Item = Value;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Value>, CodecError> {
        let length = match self.pending {
            Some(length) => length,
            None => {
                let Some(header_end) = find_header_end(src) else {
                    return Ok(None);
                };
                let header = std::str::from_utf8(&src[..header_end])
                    .map_err(|_| CodecError::InvalidHeader("header is not UTF-8".to_string()))?;
                let length = parse_content_length(header)?;
                src.advance(header_end + 4);
                self.pending = Some(length);
                length
            }
        };

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        self.pending = None;
        let body = src.split_to(length);
        Ok(Some(serde_json::from_slice(&body)?))
    }
}

impl Encoder<Value> for LspCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Value, dst: &mut BytesMut) -> Result<(), CodecError> {
        let body = serde_json::to_vec(&item)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        dst.reserve(header.len() + body.len());
        dst.put_slice(header.as_bytes());
        dst.put_slice(&body);
        Ok(())
    }
}

fn find_header_end(src: &[u8]) -> Option<usize> {
    src.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_content_length(header: &str) -> Result<usize, CodecError> {
    for line in header.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            return Err(CodecError::InvalidHeader(format!("malformed header line `{line}`")));
        };
        if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
            return value
                .trim()
                .parse()
                .map_err(|_| CodecError::InvalidHeader(format!("bad Content-Length `{}`", value.trim())));
        }
    }
    Err(CodecError::InvalidHeader("missing Content-Length".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn frame(body: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
    }

    #[test]
    fn test_decode_single_message() {
        let mut codec = LspCodec::new();
        let mut buf = BytesMut::from(frame(r#"{"jsonrpc":"2.0","method":"exit"}"#).as_str());
        let msg = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(msg, json!({"jsonrpc": "2.0", "method": "exit"}));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_body() {
        let mut codec = LspCodec::new();
        let full = frame(r#"{"id":1}"#);
        let (head, tail) = full.split_at(full.len() - 3);
        let mut buf = BytesMut::from(head);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(tail.as_bytes());
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(json!({"id": 1})));
    }

    #[test]
    fn test_decode_two_messages_and_extra_headers() {
        let mut codec = LspCodec::new();
        let body = r#"{"id":2}"#;
        let text = format!(
            "{}Content-Type: application/vscode-jsonrpc; charset=utf-8\r\ncontent-length: {}\r\n\r\n{}",
            frame(r#"{"id":1}"#),
            body.len(),
            body
        );
        let mut buf = BytesMut::from(text.as_str());
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(json!({"id": 1})));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(json!({"id": 2})));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_missing_length_is_an_error() {
        let mut codec = LspCodec::new();
        let mut buf = BytesMut::from("Content-Type: x\r\n\r\n{}");
        assert!(matches!(codec.decode(&mut buf), Err(CodecError::InvalidHeader(_))));
    }

    #[test]
    fn test_encode_counts_bytes() {
        let mut codec = LspCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(json!({"text": "é"}), &mut buf).unwrap();
        let text = std::str::from_utf8(&buf).unwrap();
        assert_eq!(text, "Content-Length: 13\r\n\r\n{\"text\":\"é\"}");
    }
}
