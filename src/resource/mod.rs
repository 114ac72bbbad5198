//! CoAP resources and request dispatch.
//!
//! A [`Resource`] is one addressable endpoint. The [`ResourceRegistry`]
//! owns every resource, routes inbound [`Request`]s by exact path and turns
//! every failure into an error [`Response`] so the serving loop never stops.
//!
//! # Resources
//!
//! | Path | Methods | Type |
//! |------|---------|------|
//! | `wifi/ipconfig` | GET | [`NetworkInfoResource`] |
//! | `actuators/led` | GET, PUT | [`LedResource`] |

mod led;
mod network_info;
mod registry;

use crate::codec::{CodecError, ContentFormat, Encoded};
use crate::network::NetworkError;
use crate::output::OutputError;
use std::fmt;

pub use led::{LedCommand, LedResource, LedState, LED_PATH};
pub use network_info::{NetworkInfoResource, NETWORK_INFO_PATH};
pub use registry::{DispatchError, RegistryError, ResourceRegistry};

/// CoAP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    const fn bit(self) -> u8 {
        match self {
            Self::Get => 0b0001,
            Self::Post => 0b0010,
            Self::Put => 0b0100,
            Self::Delete => 0b1000,
        }
    }

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of allowed methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodSet(u8);

impl MethodSet {
    /// No methods.
    pub const EMPTY: MethodSet = MethodSet(0);
    /// GET only.
    pub const GET: MethodSet = MethodSet::EMPTY.with(Method::Get);

    /// Add `method` to the set.
    pub const fn with(self, method: Method) -> Self {
        Self(self.0 | method.bit())
    }

    /// True if `method` is in the set.
    pub const fn contains(self, method: Method) -> bool {
        self.0 & method.bit() != 0
    }
}

/// An inbound request, as handed over by the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Uri-Path segments joined with `/`, no leading slash.
    pub path: String,
    pub method: Method,
    /// Accept option, if present.
    pub accept: Option<u16>,
    /// Content-Format option of the payload, if present.
    pub content_format: Option<u16>,
    pub payload: Vec<u8>,
}

impl Request {
    /// A GET request with an Accept option.
    pub fn get(path: impl Into<String>, accept: Option<u16>) -> Self {
        Self {
            path: path.into(),
            method: Method::Get,
            accept,
            content_format: None,
            payload: Vec::new(),
        }
    }

    /// A PUT request carrying `payload` in `content_format`.
    pub fn put(path: impl Into<String>, content_format: Option<u16>, payload: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            method: Method::Put,
            accept: None,
            content_format,
            payload,
        }
    }
}

/// CoAP response codes used by this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// 2.04
    Changed,
    /// 2.05
    Content,
    /// 4.00
    BadRequest,
    /// 4.02
    BadOption,
    /// 4.04
    NotFound,
    /// 4.05
    MethodNotAllowed,
    /// 5.00
    InternalServerError,
    /// 5.03
    ServiceUnavailable,
}

impl ResponseCode {
    /// `(class, detail)` pair, e.g. `(2, 5)` for 2.05.
    pub const fn class_detail(self) -> (u8, u8) {
        match self {
            Self::Changed => (2, 4),
            Self::Content => (2, 5),
            Self::BadRequest => (4, 0),
            Self::BadOption => (4, 2),
            Self::NotFound => (4, 4),
            Self::MethodNotAllowed => (4, 5),
            Self::InternalServerError => (5, 0),
            Self::ServiceUnavailable => (5, 3),
        }
    }

    /// True for 2.xx codes.
    pub const fn is_success(self) -> bool {
        self.class_detail().0 == 2
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (class, detail) = self.class_detail();
        write!(f, "{}.{:02}", class, detail)
    }
}

/// A response to hand back to the protocol engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: ResponseCode,
    /// Declared Content-Format of `payload`.
    pub content_format: Option<ContentFormat>,
    pub payload: Vec<u8>,
}

impl Response {
    /// 2.05 Content with an encoded representation.
    pub fn content(encoded: &Encoded) -> Self {
        Self {
            code: ResponseCode::Content,
            content_format: Some(encoded.format()),
            payload: encoded.as_bytes().to_vec(),
        }
    }

    /// A response with no payload.
    pub fn empty(code: ResponseCode) -> Self {
        Self {
            code,
            content_format: None,
            payload: Vec::new(),
        }
    }

    /// An error response with a short diagnostic payload (RFC 7252 §5.5.2).
    pub fn diagnostic(code: ResponseCode, message: impl fmt::Display) -> Self {
        Self {
            code,
            content_format: None,
            payload: message.to_string().into_bytes(),
        }
    }
}

/// One addressable endpoint.
pub trait Resource: Send + Sync {
    /// Unique path within the registry, e.g. `wifi/ipconfig`.
    fn path(&self) -> &str;

    /// Human-readable title, published in resource discovery.
    fn description(&self) -> &str;

    /// Methods this resource answers.
    fn allowed_methods(&self) -> MethodSet;

    /// Content formats this resource can represent itself in.
    fn content_formats(&self) -> &[ContentFormat] {
        &ContentFormat::ALL
    }

    /// Handle a request whose method is already known to be allowed.
    fn handle(&self, request: &Request) -> Result<Response, ResourceError>;
}

/// Failures inside a resource handler.
#[derive(Debug)]
pub enum ResourceError {
    /// Payload could not be encoded or decoded.
    Codec(CodecError),
    /// The backing collaborator (network stack) could not be queried.
    BackendUnavailable(NetworkError),
    /// Physical output could not be driven.
    Output(OutputError),
}

impl ResourceError {
    /// CoAP response code this failure is reported with.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            Self::Codec(CodecError::UnsupportedFormat(_)) => ResponseCode::BadOption,
            Self::Codec(CodecError::Malformed(_)) => ResponseCode::BadRequest,
            Self::Codec(_) => ResponseCode::InternalServerError,
            Self::BackendUnavailable(_) => ResponseCode::ServiceUnavailable,
            Self::Output(_) => ResponseCode::InternalServerError,
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "{}", e),
            Self::BackendUnavailable(e) => write!(f, "backend unavailable: {}", e),
            Self::Output(e) => write!(f, "output: {}", e),
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            Self::BackendUnavailable(e) => Some(e),
            Self::Output(e) => Some(e),
        }
    }
}

impl From<CodecError> for ResourceError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

impl From<OutputError> for ResourceError {
    fn from(e: OutputError) -> Self {
        Self::Output(e)
    }
}
