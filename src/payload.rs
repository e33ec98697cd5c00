// SPDX-License-Identifier: MIT
//! Base64 payload decoding for embedded metadata tags

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Errors that can occur while decoding a tag payload
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Decode a whitespace-tolerant base64 payload into raw bytes.
///
/// Real-world payloads are often line-wrapped, so all whitespace is
/// stripped before decoding. Invalid alphabet or padding fails the
/// decode; the caller aborts extraction for that tag only.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(compact.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_payload() {
        let bytes = decode_base64("aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_line_wrapped_payload() {
        let bytes = decode_base64("aGVs\nbG8=\n").unwrap();
        assert_eq!(bytes, b"hello");

        let bytes = decode_base64("  aG Vs bG 8= ").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_invalid_alphabet() {
        assert!(decode_base64("not-base64!").is_err());
    }

    #[test]
    fn test_decode_bad_padding() {
        assert!(decode_base64("aGVsbG8").is_err());
    }

    #[test]
    fn test_decode_empty_payload() {
        let bytes = decode_base64("").unwrap();
        assert!(bytes.is_empty());
    }
}
