//! `application/json` encoder and decoder.

use super::{CodecError, ContentFormat, Encoded, PayloadWriter, Representation, MAX_PAYLOAD_LEN};
use serde::de::DeserializeOwned;

/// Serialize the document form of `value` as compact JSON.
pub fn encode_json<R: Representation>(value: &R) -> Result<Encoded, CodecError> {
    let mut writer = PayloadWriter::new();
    match serde_json::to_writer(&mut writer, &value.document()) {
        Ok(()) => Ok(writer.finish(ContentFormat::StructuredText)),
        Err(_) if writer.overflowed() => Err(CodecError::EncodingOverflow {
            limit: MAX_PAYLOAD_LEN,
        }),
        Err(e) => Err(CodecError::Serialize(e.to_string())),
    }
}

/// Parse a JSON request payload.
pub fn decode_json<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(payload).map_err(|e| CodecError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::io;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        s: String,
    }

    impl Representation for Blob {
        type Document = Blob;

        fn write_text<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
            write!(out, "{}", self.s)
        }

        fn document(&self) -> Self::Document {
            Blob { s: self.s.clone() }
        }
    }

    /// `{"s":"…"}` is 8 bytes of framing around the string.
    fn blob_of_len(total: usize) -> Blob {
        Blob {
            s: "y".repeat(total - 8),
        }
    }

    // ==================== Encoding Bound Tests ====================

    #[test]
    fn test_json_exact_fit() {
        let encoded = encode_json(&blob_of_len(MAX_PAYLOAD_LEN)).unwrap();
        assert_eq!(encoded.len(), MAX_PAYLOAD_LEN);
        assert_eq!(encoded.format(), ContentFormat::StructuredText);
        assert!(encoded.as_bytes().starts_with(b"{\"s\":\"yyy"));
    }

    #[test]
    fn test_json_one_byte_over() {
        assert_eq!(
            encode_json(&blob_of_len(MAX_PAYLOAD_LEN + 1)),
            Err(CodecError::EncodingOverflow {
                limit: MAX_PAYLOAD_LEN
            })
        );
    }

    #[test]
    fn test_json_far_over() {
        assert_eq!(
            encode_json(&blob_of_len(300)),
            Err(CodecError::EncodingOverflow {
                limit: MAX_PAYLOAD_LEN
            })
        );
    }

    // ==================== Decoding Tests ====================

    #[test]
    fn test_json_decode() {
        let blob: Blob = decode_json(br#"{"s":"on"}"#).unwrap();
        assert_eq!(blob.s, "on");
        assert!(matches!(
            decode_json::<Blob>(b"{\"s\":"),
            Err(CodecError::Malformed(_))
        ));
    }
}
