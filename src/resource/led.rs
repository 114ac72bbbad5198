//! `actuators/led`: a binary LED actuator.
//!
//! GET returns the current state in the negotiated format; PUT sets it.
//! Accepted PUT payloads (by request Content-Format):
//!
//! | Format | Payload |
//! |--------|---------|
//! | text (or none) | `on`, `off`, `1`, `0`, `true`, `false` |
//! | JSON | `{"on": true}` |
//! | CBOR | `{"on": true}` |

use super::{Method, MethodSet, Request, Resource, ResourceError, Response, ResponseCode};
use crate::codec::{self, CodecError, ContentFormat, Decodable, Representation};
use crate::output::OutputLine;
use log::info;
use serde::{Deserialize, Serialize};
use std::io;
use std::sync::{Mutex, MutexGuard};

/// Path of the LED actuator resource.
pub const LED_PATH: &str = "actuators/led";

const DESCRIPTION: &str = "ESP32 LED";

/// Current LED state, as represented to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedState {
    pub on: bool,
}

#[derive(Debug, Serialize)]
pub struct LedDocument {
    led: LedSection,
}

#[derive(Debug, Serialize)]
struct LedSection {
    on: bool,
}

impl Representation for LedState {
    type Document = LedDocument;

    fn write_text<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(if self.on { b"on" } else { b"off" })
    }

    fn document(&self) -> Self::Document {
        LedDocument {
            led: LedSection { on: self.on },
        }
    }
}

/// A requested LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedCommand {
    pub on: bool,
}

impl Decodable for LedCommand {
    fn parse_text(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "on" | "1" | "true" => Some(Self { on: true }),
            "off" | "0" | "false" => Some(Self { on: false }),
            _ => None,
        }
    }
}

/// LED actuator over an exclusively owned output line.
pub struct LedResource<O> {
    output: Mutex<O>,
}

impl<O: OutputLine> LedResource<O> {
    /// Take ownership of `output`; the resource becomes its only writer.
    pub fn new(output: O) -> Self {
        Self {
            output: Mutex::new(output),
        }
    }

    fn output(&self) -> MutexGuard<'_, O> {
        match self.output.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn get(&self, request: &Request) -> Result<Response, ResourceError> {
        let format = ContentFormat::negotiate(request.accept)?;
        let state = LedState {
            on: self.output().level(),
        };
        let encoded = codec::encode(&state, format)?;
        Ok(Response::content(&encoded))
    }

    fn put(&self, request: &Request) -> Result<Response, ResourceError> {
        let format = ContentFormat::of_payload(request.content_format)?;
        if request.payload.is_empty() {
            return Err(CodecError::Malformed("empty payload".into()).into());
        }
        // Fully parse before touching the pin
        let command: LedCommand = codec::decode(&request.payload, format)?;

        self.output().set_level(command.on)?;
        info!("LED switched {}", if command.on { "on" } else { "off" });
        Ok(Response::empty(ResponseCode::Changed))
    }
}

impl<O: OutputLine> Resource for LedResource<O> {
    fn path(&self) -> &str {
        LED_PATH
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn allowed_methods(&self) -> MethodSet {
        MethodSet::GET.with(Method::Put)
    }

    fn handle(&self, request: &Request) -> Result<Response, ResourceError> {
        match request.method {
            Method::Get => self.get(request),
            Method::Put => self.put(request),
            // Registry filters methods first; this only guards direct calls
            _ => Ok(Response::empty(ResponseCode::MethodNotAllowed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MemoryOutput;

    fn led() -> (LedResource<MemoryOutput>, MemoryOutput) {
        let line = MemoryOutput::new("led");
        (LedResource::new(line.clone()), line)
    }

    fn cbor(value: &impl Serialize) -> Vec<u8> {
        let mut out = Vec::new();
        ciborium::into_writer(value, &mut out).unwrap();
        out
    }

    #[derive(Serialize)]
    struct OnField {
        on: bool,
    }

    // ==================== PUT Tests ====================

    #[test]
    fn test_put_text() {
        let (resource, line) = led();
        let response = resource
            .handle(&Request::put(LED_PATH, None, b"on".to_vec()))
            .unwrap();
        assert_eq!(response.code, ResponseCode::Changed);
        assert!(line.level());

        resource
            .handle(&Request::put(LED_PATH, Some(0), b" OFF\n".to_vec()))
            .unwrap();
        assert!(!line.level());
    }

    #[test]
    fn test_put_json() {
        let (resource, line) = led();
        resource
            .handle(&Request::put(LED_PATH, Some(50), br#"{"on":true}"#.to_vec()))
            .unwrap();
        assert!(line.level());
    }

    #[test]
    fn test_put_cbor() {
        let (resource, line) = led();
        let payload = cbor(&OnField { on: true });
        resource
            .handle(&Request::put(LED_PATH, Some(60), payload))
            .unwrap();
        assert!(line.level());
    }

    #[test]
    fn test_malformed_payload_leaves_output_untouched() {
        let (resource, line) = led();
        let bad = [
            Request::put(LED_PATH, None, b"blink".to_vec()),
            Request::put(LED_PATH, None, Vec::new()),
            Request::put(LED_PATH, Some(50), br#"{"on":"yes"}"#.to_vec()),
            Request::put(LED_PATH, Some(50), br#"{"on":true,"extra":1}"#.to_vec()),
            Request::put(LED_PATH, Some(60), vec![0xFF, 0x00]),
        ];
        for request in &bad {
            let err = resource.handle(request).unwrap_err();
            assert_eq!(err.response_code(), ResponseCode::BadRequest, "{:?}", request);
        }
        assert_eq!(line.writes(), 0);
    }

    #[test]
    fn test_put_unknown_content_format() {
        let (resource, line) = led();
        let err = resource
            .handle(&Request::put(LED_PATH, Some(41), b"<on/>".to_vec()))
            .unwrap_err();
        assert_eq!(err.response_code(), ResponseCode::BadOption);
        assert_eq!(line.writes(), 0);
    }

    // ==================== GET Tests ====================

    #[test]
    fn test_get_reflects_put() {
        let (resource, _line) = led();
        let off = resource.handle(&Request::get(LED_PATH, Some(0))).unwrap();
        assert_eq!(off.payload, b"off");

        resource
            .handle(&Request::put(LED_PATH, None, b"1".to_vec()))
            .unwrap();
        let on = resource.handle(&Request::get(LED_PATH, Some(50))).unwrap();
        assert_eq!(on.payload, br#"{"led":{"on":true}}"#);
        assert_eq!(on.content_format, Some(ContentFormat::StructuredText));
    }

    #[test]
    fn test_get_requires_accept() {
        let (resource, _line) = led();
        let err = resource.handle(&Request::get(LED_PATH, None)).unwrap_err();
        assert_eq!(err.response_code(), ResponseCode::BadOption);
    }
}
