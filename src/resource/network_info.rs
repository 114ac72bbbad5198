//! `wifi/ipconfig`: the station's live IPv4 configuration.
//!
//! ```text
//! text/plain        IP: 192.168.1.10, Mask: 255.255.255.0, Gateway: 192.168.1.1
//! application/json  {"wifi":{"ip":"192.168.1.10","mask":"255.255.255.0","gateway":"192.168.1.1"}}
//! application/cbor  {"wifi": {"ip": "...", "mask": "...", "gateway": "..."}}
//! ```

use super::{MethodSet, Request, Resource, ResourceError, Response};
use crate::codec::{self, ContentFormat, Representation};
use crate::network::{NetworkInfo, NetworkInfoSource};
use serde::{Serialize, Serializer};
use std::io;
use std::net::Ipv4Addr;

/// Path of the network info resource.
pub const NETWORK_INFO_PATH: &str = "wifi/ipconfig";

const DESCRIPTION: &str = "ESP32 IP configuration";

/// Read-only resource reporting address, mask and gateway.
pub struct NetworkInfoResource<S> {
    source: S,
}

impl<S: NetworkInfoSource> NetworkInfoResource<S> {
    /// Create the resource over a live network info source.
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: NetworkInfoSource> Resource for NetworkInfoResource<S> {
    fn path(&self) -> &str {
        NETWORK_INFO_PATH
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn allowed_methods(&self) -> MethodSet {
        MethodSet::GET
    }

    fn handle(&self, request: &Request) -> Result<Response, ResourceError> {
        // Reject the format before touching the network stack
        let format = ContentFormat::negotiate(request.accept)?;
        let info = self
            .source
            .network_info()
            .map_err(ResourceError::BackendUnavailable)?;
        let encoded = codec::encode(&info, format)?;
        Ok(Response::content(&encoded))
    }
}

/// Structured form: `{"wifi": {"ip", "mask", "gateway"}}`.
#[derive(Debug, Serialize)]
pub struct NetworkInfoDocument {
    wifi: WifiSection,
}

#[derive(Debug, Serialize)]
struct WifiSection {
    #[serde(serialize_with = "dotted")]
    ip: Ipv4Addr,
    #[serde(serialize_with = "dotted")]
    mask: Ipv4Addr,
    #[serde(serialize_with = "dotted")]
    gateway: Ipv4Addr,
}

/// Dotted-decimal string in every format, including binary ones.
fn dotted<S: Serializer>(addr: &Ipv4Addr, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(addr)
}

impl Representation for NetworkInfo {
    type Document = NetworkInfoDocument;

    fn write_text<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(
            out,
            "IP: {}, Mask: {}, Gateway: {}",
            self.address, self.mask, self.gateway
        )
    }

    fn document(&self) -> Self::Document {
        NetworkInfoDocument {
            wifi: WifiSection {
                ip: self.address,
                mask: self.mask,
                gateway: self.gateway,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkError;
    use crate::resource::ResponseCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticInfo(NetworkInfo);

    impl NetworkInfoSource for StaticInfo {
        fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
            Ok(self.0)
        }
    }

    /// Fails every query and counts attempts.
    struct BrokenInfo(AtomicUsize);

    impl NetworkInfoSource for BrokenInfo {
        fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(NetworkError::NoAddress)
        }
    }

    fn home_network() -> NetworkInfo {
        NetworkInfo::new(
            Ipv4Addr::new(192, 168, 1, 10),
            Ipv4Addr::new(255, 255, 255, 0),
            Ipv4Addr::new(192, 168, 1, 1),
        )
    }

    fn wifi_strings(value: &serde_json::Value) -> (String, String, String) {
        let wifi = &value["wifi"];
        (
            wifi["ip"].as_str().unwrap().to_string(),
            wifi["mask"].as_str().unwrap().to_string(),
            wifi["gateway"].as_str().unwrap().to_string(),
        )
    }

    fn expected_strings() -> (String, String, String) {
        (
            "192.168.1.10".to_string(),
            "255.255.255.0".to_string(),
            "192.168.1.1".to_string(),
        )
    }

    // ==================== Encoding Tests ====================

    #[test]
    fn test_plain_text_line() {
        let encoded = codec::encode(&home_network(), ContentFormat::PlainText).unwrap();
        assert_eq!(
            encoded.as_bytes(),
            b"IP: 192.168.1.10, Mask: 255.255.255.0, Gateway: 192.168.1.1"
        );
        assert_eq!(encoded.format(), ContentFormat::PlainText);
    }

    #[test]
    fn test_json_round_trip() {
        let encoded = codec::encode(&home_network(), ContentFormat::StructuredText).unwrap();
        assert_eq!(encoded.format(), ContentFormat::StructuredText);
        let value: serde_json::Value = serde_json::from_slice(encoded.as_bytes()).unwrap();
        assert_eq!(wifi_strings(&value), expected_strings());
    }

    #[test]
    fn test_cbor_round_trip() {
        let encoded = codec::encode(&home_network(), ContentFormat::CompactBinary).unwrap();
        assert_eq!(encoded.format(), ContentFormat::CompactBinary);

        // Top level is a one-entry map
        assert_eq!(encoded.as_bytes()[0], 0xA1);

        let value: ciborium::value::Value = ciborium::from_reader(encoded.as_bytes()).unwrap();
        let json: serde_json::Value = value.deserialized().unwrap();
        assert_eq!(wifi_strings(&json), expected_strings());
    }

    #[test]
    fn test_extreme_addresses_fit() {
        let widest = NetworkInfo::new(
            Ipv4Addr::new(255, 255, 255, 255),
            Ipv4Addr::new(255, 255, 255, 255),
            Ipv4Addr::new(255, 255, 255, 255),
        );
        for format in ContentFormat::ALL {
            let encoded = codec::encode(&widest, format).unwrap();
            assert!(encoded.len() <= codec::MAX_PAYLOAD_LEN);
        }
    }

    // ==================== Handler Tests ====================

    #[test]
    fn test_get_is_byte_identical_across_calls() {
        let resource = NetworkInfoResource::new(StaticInfo(home_network()));
        for format in ContentFormat::ALL {
            let request = Request::get(NETWORK_INFO_PATH, Some(format.code()));
            let first = resource.handle(&request).unwrap();
            let second = resource.handle(&request).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.code, ResponseCode::Content);
            assert_eq!(first.content_format, Some(format));
        }
    }

    #[test]
    fn test_unsupported_accept_is_bad_option() {
        let source = BrokenInfo(AtomicUsize::new(0));
        let resource = NetworkInfoResource::new(source);
        let err = resource
            .handle(&Request::get(NETWORK_INFO_PATH, Some(41)))
            .unwrap_err();
        assert_eq!(err.response_code(), ResponseCode::BadOption);
        // Format check happens before the backend query
        assert_eq!(resource.source.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backend_failure_is_server_error() {
        let resource = NetworkInfoResource::new(BrokenInfo(AtomicUsize::new(0)));
        let err = resource
            .handle(&Request::get(NETWORK_INFO_PATH, Some(0)))
            .unwrap_err();
        assert!(matches!(err, ResourceError::BackendUnavailable(_)));
        assert_eq!(err.response_code(), ResponseCode::ServiceUnavailable);
    }
}
