//! Network collaborator boundary.
//!
//! The node never talks to a radio directly. It drives a [`NetworkDriver`]
//! (start the station, deliver events), asks a [`NetworkInfoSource`] for the
//! live address configuration, and names the interface through a
//! [`HostnameSetter`]. Implementations:
//!
//! - **ESP32** (`esp32` feature): [`crate::wifi::WifiStation`] over ESP-IDF
//! - **Host**: [`HostNetwork`], backed by the OS network stack

use crate::config::StationConfig;
use crate::connectivity::ConnectivityStateMachine;
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

#[cfg(not(feature = "esp32"))]
mod host;

#[cfg(not(feature = "esp32"))]
pub use host::{HostHostname, HostNetwork, HostNetworkInfo};

/// Station IPv4 configuration at the moment of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkInfo {
    /// Station address.
    pub address: Ipv4Addr,
    /// Subnet mask.
    pub mask: Ipv4Addr,
    /// Default gateway.
    pub gateway: Ipv4Addr,
}

impl NetworkInfo {
    /// Create a network info value.
    pub fn new(address: Ipv4Addr, mask: Ipv4Addr, gateway: Ipv4Addr) -> Self {
        Self {
            address,
            mask,
            gateway,
        }
    }
}

/// Live query of the station's address configuration.
///
/// Called once per request; implementations must not cache.
pub trait NetworkInfoSource: Send + Sync {
    /// Current address, mask and gateway.
    fn network_info(&self) -> Result<NetworkInfo, NetworkError>;
}

impl<T: NetworkInfoSource + ?Sized> NetworkInfoSource for Arc<T> {
    fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
        (**self).network_info()
    }
}

/// Sets the hostname on the station interface.
pub trait HostnameSetter: Send + Sync {
    /// Apply `hostname` to the interface.
    fn set_hostname(&self, hostname: &str) -> Result<(), NetworkError>;
}

/// Station-mode network driver.
pub trait NetworkDriver {
    /// Keeps the event subscription alive; dropping it unsubscribes.
    type Subscription;

    /// Route driver events into `machine`.
    fn subscribe(
        &mut self,
        machine: Arc<ConnectivityStateMachine>,
    ) -> Result<Self::Subscription, NetworkError>;

    /// Configure station credentials, start the interface and begin
    /// associating. Returns without waiting for the link; progress arrives
    /// as events.
    fn start_station(&mut self, station: &StationConfig) -> Result<(), NetworkError>;
}

/// Network errors.
#[derive(Debug)]
pub enum NetworkError {
    /// Station credentials rejected by the driver.
    InvalidCredentials(String),
    /// Interface has no address configuration to report.
    NoAddress,
    /// Hostname could not be applied.
    Hostname(String),
    /// Driver call failed.
    Driver(String),
    /// Generic I/O error.
    Io(std::io::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials(msg) => write!(f, "invalid station credentials: {}", msg),
            Self::NoAddress => write!(f, "interface has no IPv4 address"),
            Self::Hostname(msg) => write!(f, "hostname: {}", msg),
            Self::Driver(msg) => write!(f, "driver error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(feature = "esp32")]
impl From<esp_idf_sys::EspError> for NetworkError {
    fn from(e: esp_idf_sys::EspError) -> Self {
        Self::Driver(format!("ESP error: {:?}", e))
    }
}
