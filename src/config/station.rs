//! Station (Wi-Fi client) credentials.
//!
//! These are platform-independent and validated before the driver ever sees
//! them, so a mis-provisioned image fails at boot instead of looping on
//! association attempts.
//!
//! # Example
//!
//! ```
//! use iotnode_esp32::config::StationConfig;
//!
//! let station = StationConfig::new("MyNetwork", "MyPassword").unwrap();
//! assert!(!station.is_open());
//! ```

use super::ConfigError;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum password length for WPA2.
pub const MAX_PASSWORD_LEN: usize = 64;

/// Minimum password length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Credentials for associating to an access point.
///
/// The passphrase is wiped from memory when the config is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StationConfig {
    ssid: String,
    password: String,
}

impl StationConfig {
    /// Create station credentials, rejecting invalid SSIDs and passphrases.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Result<Self, ConfigError> {
        let config = Self {
            ssid: ssid.into(),
            password: password.into(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Credentials for an open network (no passphrase).
    pub fn open(ssid: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(ssid, String::new())
    }

    /// Validate SSID and passphrase lengths.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssid.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.ssid.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.ssid.len(),
                max: MAX_SSID_LEN,
            });
        }

        // Empty is OK for open networks
        if !self.password.is_empty() && self.password.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: self.password.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.password.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(())
    }

    /// Network name.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// Network passphrase (empty for open networks).
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Check if this is an open network (no password).
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// Never print the passphrase, not even in debug logs.
impl std::fmt::Debug for StationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationConfig")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = StationConfig::new("TestNetwork", "password123").unwrap();
        assert_eq!(config.ssid(), "TestNetwork");
        assert_eq!(config.password(), "password123");
        assert!(!config.is_open());
    }

    #[test]
    fn test_open_network() {
        let config = StationConfig::open("OpenNetwork").unwrap();
        assert!(config.is_open());
    }

    #[test]
    fn test_empty_ssid() {
        let result = StationConfig::new("", "password123");
        assert_eq!(result, Err(ConfigError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_limits() {
        assert!(StationConfig::new("a".repeat(32), "password123").is_ok());
        let result = StationConfig::new("a".repeat(33), "password123");
        assert!(matches!(result, Err(ConfigError::SsidTooLong { len: 33, max: 32 })));
    }

    #[test]
    fn test_password_length_limits() {
        assert!(matches!(
            StationConfig::new("TestNetwork", "short"),
            Err(ConfigError::PasswordTooShort { .. })
        ));
        assert!(StationConfig::new("TestNetwork", "12345678").is_ok());
        assert!(StationConfig::new("TestNetwork", "a".repeat(64)).is_ok());
        assert!(matches!(
            StationConfig::new("TestNetwork", "a".repeat(65)),
            Err(ConfigError::PasswordTooLong { .. })
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = StationConfig::new("TestNetwork", "hunter2hunter2").unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("TestNetwork"));
        assert!(!debug.contains("hunter2"));
    }
}
