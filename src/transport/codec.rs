//! Line codec for tokio.
//!
//! Splits the byte stream on LF (a preceding CR is optional) and enforces a
//! maximum line length. Inbound lines that are oversized, not UTF-8 or carry
//! illegal control characters are logged and dropped; the stream continues
//! with the next line. Decoded lines carry no terminator; encoded lines get
//! CRLF appended.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::ProtocolError;
use crate::validation::is_illegal_control_char;

/// Maximum line length accepted by default: a full tag block (8191 bytes)
/// plus a classic 512-byte line.
pub const MAX_LINE_LEN: usize = 8191 + 512;

/// Trim the terminator from `line` and check it against the transport rules.
pub fn validate_line(line: &str, max_len: usize) -> Result<&str, ProtocolError> {
    if line.len() > max_len {
        return Err(ProtocolError::MessageTooLong {
            actual: line.len(),
            limit: max_len,
        });
    }

    let trimmed = line.trim_end_matches(['\r', '\n']);
    if let Some(ch) = trimmed.chars().find(|&c| is_illegal_control_char(c)) {
        return Err(ProtocolError::IllegalControlChar(ch));
    }
    Ok(trimmed)
}

/// Prepare an outgoing line: cut it at the first line ending and reject
/// illegal control characters.
pub fn sanitize(line: &str) -> Result<&str, ProtocolError> {
    let end = line.find(['\r', '\n']).unwrap_or(line.len());
    let line = &line[..end];
    if let Some(ch) = line.chars().find(|&c| is_illegal_control_char(c)) {
        return Err(ProtocolError::IllegalControlChar(ch));
    }
    Ok(line)
}

/// Newline-delimited UTF-8 line codec.
#[derive(Debug, Clone)]
pub struct TmiCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
    /// Set while skipping the rest of an oversized line.
    discarding: bool,
}

impl Default for TmiCodec {
    fn default() -> Self {
        Self::new(MAX_LINE_LEN)
    }
}

impl TmiCodec {
    /// Create a codec accepting lines of at most `max_len` bytes, terminator included.
    pub fn new(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }
}

fn checked_line(bytes: &[u8], max_len: usize) -> Result<String, ProtocolError> {
    let data = std::str::from_utf8(bytes)?;
    validate_line(data, max_len).map(str::to_owned)
}

impl Decoder for TmiCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        loop {
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                self.next_index = src.len();

                if src.len() > self.max_len {
                    warn!(
                        "dropping inbound line: {}",
                        ProtocolError::MessageTooLong {
                            actual: src.len(),
                            limit: self.max_len,
                        }
                    );
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }

            match checked_line(&line, self.max_len) {
                Ok(line) => return Ok(Some(line)),
                Err(e) => warn!("dropping inbound line: {}", e),
            }
        }
    }
}

impl Encoder<String> for TmiCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let line = sanitize(&msg)?;
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = TmiCodec::default();
        let mut buf = BytesMut::from("PING :tmi.twitch.tv\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :tmi.twitch.tv".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_bare_lf_and_multiple() {
        let mut codec = TmiCodec::default();
        let mut buf = BytesMut::from("PING :a\nPING :b\r\nPIN");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :a".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :b".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"G :c\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :c".to_string()));
    }

    #[test]
    fn test_decode_skips_too_long() {
        let mut codec = TmiCodec::new(10);
        let mut buf = BytesMut::from("this is way too long\nPING :a\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :a".to_string()));
        assert!(buf.is_empty());

        // The tail of an oversized line arriving later is dropped too.
        let mut codec = TmiCodec::new(10);
        let mut buf = BytesMut::from("no newline in sight");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        buf.extend_from_slice(b" still going\r\nPING :b\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :b".to_string()));
    }

    #[test]
    fn test_decode_skips_control_chars() {
        let mut codec = TmiCodec::default();
        let mut buf = BytesMut::from("PRIVMSG #a :\x02bold\r\nPING :next\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :next".to_string()));

        let mut buf = BytesMut::from("PRIVMSG #a :\x01ACTION waves\x01\r\n");
        assert!(codec.decode(&mut buf).unwrap().is_some());

        let mut buf = BytesMut::from("PRIVMSG #a :\x00\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_skips_invalid_utf8() {
        let mut codec = TmiCodec::default();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :\xff\r\nPING :ok\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :ok".to_string()));
    }

    #[test]
    fn test_encode_appends_crlf_and_truncates() {
        let mut codec = TmiCodec::default();
        let mut buf = BytesMut::new();

        codec.encode("PONG :tmi.twitch.tv".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :tmi.twitch.tv\r\n");

        buf.clear();
        codec
            .encode("PRIVMSG #a :hi\r\nPRIVMSG #b :sneaky".to_string(), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"PRIVMSG #a :hi\r\n");
    }
}
