//! Node configuration.
//!
//! - [`station`] - Wi-Fi station credentials (host-testable)
//! - [`node`] - hostname, transport security and port selection
//!
//! Firmware images take their configuration from the build environment (see
//! `build.rs`); the host binary reads the same settings at runtime.

mod node;
mod station;

use std::fmt;

pub use node::{
    parse_flag, validate_hostname, NodeConfig, DEFAULT_COAPS_PORT, DEFAULT_COAP_PORT,
    MAX_HOSTNAME_LEN,
};
pub use station::{StationConfig, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN};

/// Errors that can occur while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Password is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Password exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// Hostname is empty.
    HostnameEmpty,
    /// Hostname exceeds maximum length.
    HostnameTooLong { len: usize, max: usize },
    /// Hostname contains characters outside `[A-Za-z0-9-]` or a leading/trailing dash.
    HostnameInvalid(String),
    /// A boolean setting has an unrecognized value.
    InvalidFlag(String),
    /// A numeric setting could not be parsed.
    InvalidNumber(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::HostnameEmpty => write!(f, "hostname cannot be empty"),
            Self::HostnameTooLong { len, max } => {
                write!(f, "hostname too long: {} bytes (max {})", len, max)
            }
            Self::HostnameInvalid(name) => write!(f, "invalid hostname: {:?}", name),
            Self::InvalidFlag(value) => write!(f, "invalid boolean setting: {:?}", value),
            Self::InvalidNumber(value) => write!(f, "invalid numeric setting: {:?}", value),
        }
    }
}

impl std::error::Error for ConfigError {}
