//! ESP-IDF Wi-Fi station.
//!
//! # Components
//!
//! - [`WifiStation`] - station driver, event subscription and live IP queries
//! - [`StationHostname`] - applies the node hostname to the station netif
//! - [`StationInfo`] - [`crate::network::NetworkInfoSource`] over the netif
//!
//! Configuration types (SSID, password validation) live in [`crate::config`].

mod station;

pub use station::{StationHostname, StationInfo, WifiStation, WifiSubscription};
