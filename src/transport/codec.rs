//! Message codec
//!
//! Records are JSON objects. Boundaries are recovered by scanning for the
//! first `{` and tracking brace depth until it returns to zero, so a record
//! still decodes when it arrives wrapped in prose or split across reads.
//! Braces inside string literals do not count toward the depth.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{BargainError, Result};
use crate::negotiation::Action;

use super::message::{InboundRecord, WireRecord};

/// Partial records larger than this are dropped
pub const MAX_RECORD_LEN: usize = 64 * 1024;

/// Result of scanning a buffer for a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordScan {
    /// No opening delimiter anywhere in the buffer
    NotFound,
    /// A record starts at `start` but has not closed yet
    Incomplete { start: usize },
    /// `buf[start..end]` is a balanced record
    Complete { start: usize, end: usize },
}

/// Locate the first balanced `{ ... }` block in `buf`
pub fn scan_record(buf: &[u8]) -> RecordScan {
    let start = match buf.iter().position(|&b| b == b'{') {
        Some(start) => start,
        None => return RecordScan::NotFound,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in buf[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return RecordScan::Complete {
                        start,
                        end: start + offset + 1,
                    };
                }
            }
            _ => {}
        }
    }

    RecordScan::Incomplete { start }
}

/// Serialize an action into a self-describing record
pub fn encode(action: &Action, round: u32) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&WireRecord::new(action, round))?)
}

/// Decode the first record found in `bytes`, ignoring surrounding text
pub fn decode(bytes: &[u8]) -> Result<Action> {
    decode_record(bytes).map(WireRecord::into_action)
}

/// Like [`decode`], keeping the sender's advisory round
pub fn decode_record(bytes: &[u8]) -> Result<WireRecord> {
    match scan_record(bytes) {
        RecordScan::Complete { start, end } => parse_record(&bytes[start..end]),
        RecordScan::Incomplete { .. } => Err(BargainError::Parse(
            "record is not balanced".to_string(),
        )),
        RecordScan::NotFound => Err(BargainError::Parse("no record found".to_string())),
    }
}

fn parse_record(slice: &[u8]) -> Result<WireRecord> {
    let inbound: InboundRecord = serde_json::from_slice(slice)
        .map_err(|e| BargainError::Parse(format!("invalid record: {}", e)))?;
    inbound.validate()
}

/// Stream codec for negotiation records over a byte transport.
///
/// Each decoded item is itself a `Result`: a malformed record surfaces as
/// `Ok(Some(Err(..)))` and the stream keeps going. Only I/O failures end it.
#[derive(Clone, Debug, Default)]
pub struct ActionCodec {
    _private: (),
}

impl ActionCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for ActionCodec {
    type Item = Result<WireRecord>;
    type Error = BargainError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        match scan_record(src) {
            RecordScan::NotFound => {
                if !src.is_empty() {
                    tracing::debug!("Discarding {} bytes of non-record input", src.len());
                    src.clear();
                }
                Ok(None)
            }
            RecordScan::Incomplete { start } => {
                if start > 0 {
                    tracing::debug!("Discarding {} bytes before record", start);
                    src.advance(start);
                }
                if src.len() > MAX_RECORD_LEN {
                    let len = src.len();
                    src.clear();
                    return Ok(Some(Err(BargainError::Parse(format!(
                        "record exceeds {} bytes ({} buffered)",
                        MAX_RECORD_LEN, len
                    )))));
                }
                Ok(None)
            }
            RecordScan::Complete { start, end } => {
                let frame = src.split_to(end);
                if start > 0 {
                    tracing::debug!("Discarding {} bytes before record", start);
                }
                Ok(Some(parse_record(&frame[start..])))
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !buf.is_empty() {
                    tracing::debug!("Dropping {} bytes of incomplete record at EOF", buf.len());
                    buf.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<WireRecord> for ActionCodec {
    type Error = BargainError;

    fn encode(&mut self, item: WireRecord, dst: &mut BytesMut) -> Result<()> {
        let bytes = serde_json::to_vec(&item)?;
        dst.reserve(bytes.len() + 1);
        dst.extend_from_slice(&bytes);
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn test_round_trip() {
        let actions = vec![
            Action::offer(252_000, "Welcome!"),
            Action::counter(150_000, "ok"),
            Action::accept(160_000, "Deal accepted."),
            Action::reject("Too expensive, I cannot proceed."),
            Action::confirm(160_000, "Deal confirmed!"),
            Action::counter(0, ""),
            Action::counter(u64::MAX, "quote \" and {brace} and \\ slash"),
        ];

        for action in actions {
            let bytes = encode(&action, 3).unwrap();
            assert_eq!(decode(&bytes).unwrap(), action);
        }
    }

    #[test]
    fn test_decode_record_embedded_in_noise() {
        let raw = b"blah blah {\"kind\":\"counter\",\"price\":150000,\"message\":\"ok\"} trailing junk";

        let action = decode(raw).unwrap();

        assert_eq!(action, Action::counter(150_000, "ok"));
    }

    #[test]
    fn test_noise_does_not_change_result() {
        let bare = encode(&Action::accept(170_000, "fine"), 2).unwrap();
        let mut noisy = b"```json\nSure! Here is my answer:\n".to_vec();
        noisy.extend_from_slice(&bare);
        noisy.extend_from_slice(b"\n```\nLet me know.");

        assert_eq!(decode(&bare).unwrap(), decode(&noisy).unwrap());
    }

    #[test]
    fn test_nested_objects_balance() {
        let raw = br#"{"kind":"counter","price":5,"message":"x","meta":{"a":{"b":1}}} {"kind":"reject"}"#;
        assert_eq!(decode(raw).unwrap(), Action::counter(5, "x"));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode(b"no json here"), Err(BargainError::Parse(_))));
        assert!(matches!(decode(b""), Err(BargainError::Parse(_))));
        assert!(matches!(
            decode(b"{\"kind\":\"counter\""),
            Err(BargainError::Parse(_))
        ));
        assert!(matches!(decode(b"{not json}"), Err(BargainError::Parse(_))));
    }

    #[test]
    fn test_unknown_kind_normalizes() {
        let action = decode(br#"{"kind":"ACCEPTED","price":160000}"#).unwrap();
        assert_eq!(action, Action::accept(160_000, ""));

        let action = decode(br#"{"kind":"rejection"}"#).unwrap();
        assert_eq!(action, Action::reject(""));

        let action = decode(br#"{"kind":"maybe","price":10}"#).unwrap();
        assert_eq!(action, Action::counter(10, ""));
    }

    #[test]
    fn test_decode_keeps_advisory_round() {
        let bytes = encode(&Action::counter(1, "a"), 7).unwrap();
        assert_eq!(decode_record(&bytes).unwrap().round, 7);
    }

    #[test]
    fn test_scan_record() {
        assert_eq!(scan_record(b"abc"), RecordScan::NotFound);
        assert_eq!(scan_record(b"ab{\"x\":{"), RecordScan::Incomplete { start: 2 });
        assert_eq!(
            scan_record(b"ab{\"x\":\"}\"}cd"),
            RecordScan::Complete { start: 2, end: 11 }
        );
    }

    #[tokio::test]
    async fn test_stream_recovers_split_and_noisy_records() {
        let reader = tokio_test::io::Builder::new()
            .read(b"hello {\"kind\":\"offer\",\"price\":252")
            .read(b"000,\"message\":\"Welcome\"}\n{\"kind\":")
            .read(b"\"counter\",\"price\":160000}garbage{oops}")
            .read(b"{\"kind\":\"accept\",\"price\":160000,\"message\":\"deal\"}{\"kind\":")
            .build();

        let mut frames = FramedRead::new(reader, ActionCodec::new());

        let first = frames.next().await.unwrap().unwrap().unwrap();
        assert_eq!(first.into_action(), Action::offer(252_000, "Welcome"));

        let second = frames.next().await.unwrap().unwrap().unwrap();
        assert_eq!(second.into_action(), Action::counter(160_000, ""));

        let third = frames.next().await.unwrap().unwrap();
        assert!(matches!(third, Err(BargainError::Parse(_))));

        let fourth = frames.next().await.unwrap().unwrap().unwrap();
        assert_eq!(fourth.into_action(), Action::accept(160_000, "deal"));

        // Incomplete tail at EOF is dropped rather than reported
        assert!(frames.next().await.is_none());
    }

    #[test]
    fn test_oversized_partial_record_is_dropped() {
        let mut codec = ActionCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(b"{\"message\":\"");
        buf.extend_from_slice(&vec![b'a'; MAX_RECORD_LEN + 1]);

        let frame = codec.decode(&mut buf).unwrap();

        assert!(matches!(frame, Some(Err(BargainError::Parse(_)))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encoder_appends_newline() {
        let mut codec = ActionCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(WireRecord::new(&Action::counter(1, "x"), 1), &mut buf)
            .unwrap();

        assert_eq!(buf.last(), Some(&b'\n'));
        assert_eq!(decode(&buf).unwrap(), Action::counter(1, "x"));
    }
}
