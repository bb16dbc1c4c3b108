//! Record framing: `type:u8 | version:u16_be | length:u16_be | payload`
//! (spec.md §4.1).

use crate::constants::{is_tls_version, ContentType, MAX_CIPHERTEXT_LEN};
use crate::error::{Error, Result};

pub const HEADER_LEN: usize = 5;

/// Result of attempting to parse one record header + payload off the front
/// of an inbound buffer.
pub enum ParsedRecord<'a> {
    /// Not enough bytes yet; caller should wait for more.
    Incomplete,
    /// A complete record, along with the number of bytes it occupied.
    Complete {
        content_type: ContentType,
        version: u16,
        payload: &'a [u8],
        consumed: usize,
    },
}

/// Parses one record off the front of `buf` without consuming it (the
/// caller advances its own read offset by `consumed`), per spec.md §4.1
/// steps 1-4.
pub fn parse_record(buf: &[u8]) -> Result<ParsedRecord<'_>> {
    if buf.len() < HEADER_LEN {
        return Ok(ParsedRecord::Incomplete);
    }

    let type_byte = buf[0];
    let version = u16::from_be_bytes([buf[1], buf[2]]);
    let length = u16::from_be_bytes([buf[3], buf[4]]) as usize;

    if !is_tls_version(version) {
        return Err(Error::ProtocolVersion(version));
    }

    let content_type = ContentType::from_u8(type_byte)
        .map_err(|_| Error::UnexpectedMessage(format!("content type {type_byte}")))?;

    if length > MAX_CIPHERTEXT_LEN {
        return Err(Error::RecordOverflow(length));
    }

    if buf.len() < HEADER_LEN + length {
        return Ok(ParsedRecord::Incomplete);
    }

    Ok(ParsedRecord::Complete {
        content_type,
        version,
        payload: &buf[HEADER_LEN..HEADER_LEN + length],
        consumed: HEADER_LEN + length,
    })
}

/// Prepends a record header to an already-protected payload.
pub fn frame(content_type: ContentType, version: u16, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_CIPHERTEXT_LEN {
        return Err(Error::RecordOverflow(payload.len()));
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(content_type.to_u8());
    out.extend_from_slice(&version.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_header_requests_more() {
        let buf = [22, 3, 3, 0];
        assert!(matches!(parse_record(&buf).unwrap(), ParsedRecord::Incomplete));
    }

    #[test]
    fn incomplete_payload_requests_more() {
        let buf = [22, 3, 3, 0, 5, 1, 2];
        assert!(matches!(parse_record(&buf).unwrap(), ParsedRecord::Incomplete));
    }

    #[test]
    fn complete_record_reports_consumed_length() {
        let mut buf = vec![23, 3, 3, 0, 3];
        buf.extend_from_slice(b"abc");
        buf.extend_from_slice(b"trailing");
        match parse_record(&buf).unwrap() {
            ParsedRecord::Complete {
                content_type,
                payload,
                consumed,
                ..
            } => {
                assert_eq!(content_type, ContentType::ApplicationData);
                assert_eq!(payload, b"abc");
                assert_eq!(consumed, 8);
            }
            ParsedRecord::Incomplete => panic!("expected a complete record"),
        }
    }

    #[test]
    fn bad_version_is_rejected() {
        let buf = [22, 9, 9, 0, 0];
        assert!(matches!(parse_record(&buf), Err(Error::ProtocolVersion(_))));
    }

    #[test]
    fn unknown_content_type_is_rejected() {
        let buf = [99, 3, 3, 0, 0];
        assert!(matches!(parse_record(&buf), Err(Error::UnexpectedMessage(_))));
    }
}
