//! `application/cbor` encoder and decoder.
//!
//! Structs serialize as CBOR maps keyed by text strings, so a document type
//! maps one-to-one onto the wire map. Strings are definite-length; the
//! payload length is exactly the number of bytes written.

use super::{CodecError, ContentFormat, Encoded, PayloadWriter, Representation, MAX_PAYLOAD_LEN};
use serde::de::DeserializeOwned;

/// Serialize the document form of `value` as CBOR.
pub fn encode_cbor<R: Representation>(value: &R) -> Result<Encoded, CodecError> {
    let mut writer = PayloadWriter::new();
    match ciborium::into_writer(&value.document(), &mut writer) {
        Ok(()) => Ok(writer.finish(ContentFormat::CompactBinary)),
        Err(_) if writer.overflowed() => Err(CodecError::EncodingOverflow {
            limit: MAX_PAYLOAD_LEN,
        }),
        Err(e) => Err(CodecError::Serialize(e.to_string())),
    }
}

/// Parse a CBOR request payload.
pub fn decode_cbor<T: DeserializeOwned>(payload: &[u8]) -> Result<T, CodecError> {
    ciborium::from_reader(payload).map_err(|e| CodecError::Malformed(e.to_string()))
}
