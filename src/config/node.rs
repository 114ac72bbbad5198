//! Node-level configuration: hostname, station credentials and CoAP transport.

use super::{ConfigError, StationConfig};

/// Maximum hostname length accepted by the ESP-IDF netif layer.
pub const MAX_HOSTNAME_LEN: usize = 32;

/// Default CoAP port (RFC 7252).
pub const DEFAULT_COAP_PORT: u16 = 5683;

/// Default CoAP port when DTLS is in use (RFC 7252).
pub const DEFAULT_COAPS_PORT: u16 = 5684;

/// Everything the orchestrator needs to bring the node up.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Hostname announced by the station interface (DHCP option 12).
    pub hostname: String,
    /// Access point credentials.
    pub station: StationConfig,
    /// Whether the protocol engine must run over DTLS.
    pub use_secure_transport: bool,
    /// UDP port the protocol engine listens on.
    pub coap_port: u16,
}

impl NodeConfig {
    /// Build a validated node configuration.
    pub fn new(
        hostname: impl Into<String>,
        station: StationConfig,
        use_secure_transport: bool,
    ) -> Result<Self, ConfigError> {
        let hostname = hostname.into();
        validate_hostname(&hostname)?;
        Ok(Self {
            hostname,
            station,
            use_secure_transport,
            coap_port: if use_secure_transport {
                DEFAULT_COAPS_PORT
            } else {
                DEFAULT_COAP_PORT
            },
        })
    }

    /// Override the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.coap_port = port;
        self
    }

    /// Configuration baked into the firmware image.
    ///
    /// `build.rs` refuses to build an `esp32` image without these variables,
    /// so only their contents can still be wrong at this point.
    #[cfg(feature = "esp32")]
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let station = StationConfig::new(
            env!("IOTNODE_WIFI_SSID"),
            env!("IOTNODE_WIFI_PASSWORD"),
        )?;
        let secure = parse_flag(option_env!("IOTNODE_COAP_SECURE"))?;
        Self::new(env!("IOTNODE_HOSTNAME"), station, secure)
    }
}

/// Parse a `0`/`1` style boolean setting; absent means off.
pub fn parse_flag(value: Option<&str>) -> Result<bool, ConfigError> {
    match value.map(str::trim) {
        None | Some("") | Some("0") | Some("false") | Some("no") => Ok(false),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some(other) => Err(ConfigError::InvalidFlag(other.to_string())),
    }
}

/// Validate a hostname label (RFC 1123, single label).
pub fn validate_hostname(hostname: &str) -> Result<(), ConfigError> {
    if hostname.is_empty() {
        return Err(ConfigError::HostnameEmpty);
    }
    if hostname.len() > MAX_HOSTNAME_LEN {
        return Err(ConfigError::HostnameTooLong {
            len: hostname.len(),
            max: MAX_HOSTNAME_LEN,
        });
    }
    let valid_chars = hostname
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if !valid_chars || hostname.starts_with('-') || hostname.ends_with('-') {
        return Err(ConfigError::HostnameInvalid(hostname.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station() -> StationConfig {
        StationConfig::new("TestNetwork", "password123").unwrap()
    }

    #[test]
    fn test_node_config_ports() {
        let plain = NodeConfig::new("iotnode", station(), false).unwrap();
        assert_eq!(plain.coap_port, DEFAULT_COAP_PORT);

        let secure = NodeConfig::new("iotnode", station(), true).unwrap();
        assert_eq!(secure.coap_port, DEFAULT_COAPS_PORT);

        assert_eq!(plain.with_port(15683).coap_port, 15683);
    }

    #[test]
    fn test_hostname_validation() {
        assert!(validate_hostname("iotnode").is_ok());
        assert!(validate_hostname("esp32-node-01").is_ok());
        assert_eq!(validate_hostname(""), Err(ConfigError::HostnameEmpty));
        assert!(matches!(
            validate_hostname(&"a".repeat(33)),
            Err(ConfigError::HostnameTooLong { .. })
        ));
        assert!(matches!(
            validate_hostname("-node"),
            Err(ConfigError::HostnameInvalid(_))
        ));
        assert!(matches!(
            validate_hostname("node_1"),
            Err(ConfigError::HostnameInvalid(_))
        ));
    }

    #[test]
    fn test_invalid_hostname_rejected_by_node_config() {
        let result = NodeConfig::new("bad host", station(), false);
        assert!(matches!(result, Err(ConfigError::HostnameInvalid(_))));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(None), Ok(false));
        assert_eq!(parse_flag(Some("0")), Ok(false));
        assert_eq!(parse_flag(Some(" 1 ")), Ok(true));
        assert_eq!(parse_flag(Some("true")), Ok(true));
        assert!(matches!(
            parse_flag(Some("maybe")),
            Err(ConfigError::InvalidFlag(_))
        ));
    }
}
