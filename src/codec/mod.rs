//! Content negotiation and payload encoding.
//!
//! Every resource representation can be rendered in three CoAP content
//! formats:
//!
//! | Format | CoAP Content-Format | Encoder |
//! |--------|---------------------|---------|
//! | [`ContentFormat::PlainText`] | 0 (`text/plain;charset=utf-8`) | [`encode_text`] |
//! | [`ContentFormat::StructuredText`] | 50 (`application/json`) | [`encode_json`] |
//! | [`ContentFormat::CompactBinary`] | 60 (`application/cbor`) | [`encode_cbor`] |
//!
//! All encoders write into a fixed [`MAX_PAYLOAD_LEN`] byte buffer and fail
//! with [`CodecError::EncodingOverflow`] instead of truncating.
//!
//! # Example
//!
//! ```
//! use iotnode_esp32::codec::{encode, ContentFormat};
//! use iotnode_esp32::network::NetworkInfo;
//! use std::net::Ipv4Addr;
//!
//! let info = NetworkInfo::new(
//!     Ipv4Addr::new(192, 168, 1, 10),
//!     Ipv4Addr::new(255, 255, 255, 0),
//!     Ipv4Addr::new(192, 168, 1, 1),
//! );
//! let format = ContentFormat::negotiate(Some(0)).unwrap();
//! let encoded = encode(&info, format).unwrap();
//! assert_eq!(
//!     encoded.as_bytes(),
//!     b"IP: 192.168.1.10, Mask: 255.255.255.0, Gateway: 192.168.1.1"
//! );
//! ```

mod buffer;
mod cbor;
mod json;
mod text;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::io;

pub use buffer::{Encoded, PayloadWriter};
pub use cbor::{decode_cbor, encode_cbor};
pub use json::{decode_json, encode_json};
pub use text::encode_text;

/// Largest payload any encoder will produce.
pub const MAX_PAYLOAD_LEN: usize = 250;

/// Wire encodings a representation can be negotiated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentFormat {
    /// Human-readable single line.
    PlainText,
    /// JSON document.
    StructuredText,
    /// CBOR map.
    CompactBinary,
}

impl ContentFormat {
    /// Every supported format, in CoAP Content-Format order.
    pub const ALL: [ContentFormat; 3] = [
        ContentFormat::PlainText,
        ContentFormat::StructuredText,
        ContentFormat::CompactBinary,
    ];

    /// CoAP Content-Format registry number.
    pub const fn code(self) -> u16 {
        match self {
            Self::PlainText => 0,
            Self::StructuredText => 50,
            Self::CompactBinary => 60,
        }
    }

    /// IANA media type.
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::PlainText => "text/plain;charset=utf-8",
            Self::StructuredText => "application/json",
            Self::CompactBinary => "application/cbor",
        }
    }

    /// Look up a format by CoAP Content-Format number.
    pub fn from_code(code: u16) -> Result<Self, CodecError> {
        Self::ALL
            .into_iter()
            .find(|format| format.code() == code)
            .ok_or(CodecError::UnsupportedFormat(Some(code)))
    }

    /// Pick the response format for a request's Accept option.
    ///
    /// A missing Accept option is rejected: the node never guesses a format
    /// the client did not ask for.
    pub fn negotiate(accept: Option<u16>) -> Result<Self, CodecError> {
        match accept {
            Some(code) => Self::from_code(code),
            None => Err(CodecError::UnsupportedFormat(None)),
        }
    }

    /// Format of an inbound request payload. A payload without a
    /// Content-Format option is read as plain text.
    pub fn of_payload(content_format: Option<u16>) -> Result<Self, CodecError> {
        content_format.map_or(Ok(Self::PlainText), Self::from_code)
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.media_type(), self.code())
    }
}

/// A value with a text line and a structured document form.
pub trait Representation {
    /// Document serialized for JSON and CBOR.
    type Document: Serialize;

    /// Write the plain-text form.
    fn write_text<W: io::Write>(&self, out: &mut W) -> io::Result<()>;

    /// Build the structured form.
    fn document(&self) -> Self::Document;
}

/// A request payload that can be parsed from any supported format.
pub trait Decodable: DeserializeOwned {
    /// Parse the plain-text form. `None` means the text is not a valid command.
    fn parse_text(text: &str) -> Option<Self>;
}

/// Encode `value` in the requested format.
pub fn encode<R: Representation>(value: &R, format: ContentFormat) -> Result<Encoded, CodecError> {
    match format {
        ContentFormat::PlainText => encode_text(value),
        ContentFormat::StructuredText => encode_json(value),
        ContentFormat::CompactBinary => encode_cbor(value),
    }
}

/// Decode a request payload in the given format.
pub fn decode<D: Decodable>(payload: &[u8], format: ContentFormat) -> Result<D, CodecError> {
    match format {
        ContentFormat::PlainText => {
            let text = std::str::from_utf8(payload)
                .map_err(|_| CodecError::Malformed("payload is not UTF-8".into()))?;
            D::parse_text(text.trim())
                .ok_or_else(|| CodecError::Malformed(format!("unrecognized value {:?}", text)))
        }
        ContentFormat::StructuredText => decode_json(payload),
        ContentFormat::CompactBinary => decode_cbor(payload),
    }
}

/// Errors raised while encoding or decoding payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Requested content format is not supported (`None`: no format given).
    UnsupportedFormat(Option<u16>),
    /// Encoded form would exceed the payload buffer.
    EncodingOverflow { limit: usize },
    /// Serializer failed for a reason other than buffer space.
    Serialize(String),
    /// Inbound payload could not be parsed.
    Malformed(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(Some(code)) => {
                write!(f, "unsupported content format {}", code)
            }
            Self::UnsupportedFormat(None) => write!(f, "no content format requested"),
            Self::EncodingOverflow { limit } => {
                write!(f, "encoded payload exceeds {} bytes", limit)
            }
            Self::Serialize(msg) => write!(f, "serialization failed: {}", msg),
            Self::Malformed(msg) => write!(f, "malformed payload: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}
