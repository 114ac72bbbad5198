//! Host network provider.
//!
//! On host systems, the OS handles networking. The driver replays the
//! station lifecycle as events so the rest of the node behaves exactly as on
//! the device.

use super::{HostnameSetter, NetworkDriver, NetworkError, NetworkInfo, NetworkInfoSource};
use crate::config::StationConfig;
use crate::connectivity::{ConnectivityStateMachine, NetworkEvent};
use log::{info, warn};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Host network driver.
pub struct HostNetwork {
    info: HostNetworkInfo,
    machine: Option<Arc<ConnectivityStateMachine>>,
}

impl HostNetwork {
    /// Create a host network driver assuming a /24 subnet.
    pub fn new() -> Self {
        Self {
            info: HostNetworkInfo {
                mask: Ipv4Addr::new(255, 255, 255, 0),
                gateway: None,
            },
            machine: None,
        }
    }

    /// Report `mask` instead of the /24 default.
    pub fn with_mask(mut self, mask: Ipv4Addr) -> Self {
        self.info.mask = mask;
        self
    }

    /// Report `gateway` instead of the first host of the subnet.
    pub fn with_gateway(mut self, gateway: Ipv4Addr) -> Self {
        self.info.gateway = Some(gateway);
        self
    }

    /// Live network info source for resources.
    pub fn info_source(&self) -> HostNetworkInfo {
        self.info.clone()
    }

    fn emit(&self, event: NetworkEvent) {
        if let Some(machine) = &self.machine {
            machine.handle_event(event);
        }
    }
}

impl Default for HostNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkDriver for HostNetwork {
    type Subscription = ();

    fn subscribe(
        &mut self,
        machine: Arc<ConnectivityStateMachine>,
    ) -> Result<Self::Subscription, NetworkError> {
        self.machine = Some(machine);
        Ok(())
    }

    fn start_station(&mut self, station: &StationConfig) -> Result<(), NetworkError> {
        // The OS owns association; the SSID is only reported
        info!("Host network: ignoring station SSID {:?}", station.ssid());

        self.emit(NetworkEvent::StationStart);
        match detect_local_ipv4() {
            Some(ip) => {
                info!("Host network ready, local IP: {}", ip);
                self.emit(NetworkEvent::StationLinkUp);
                self.emit(NetworkEvent::AddressAcquired);
            }
            None => {
                warn!("Host network has no IPv4 route; staying disconnected");
                self.emit(NetworkEvent::StationDisconnected);
            }
        }
        Ok(())
    }
}

/// Address configuration of the host's default route.
#[derive(Debug, Clone)]
pub struct HostNetworkInfo {
    mask: Ipv4Addr,
    gateway: Option<Ipv4Addr>,
}

impl HostNetworkInfo {
    fn describe(&self, address: Ipv4Addr) -> NetworkInfo {
        let gateway = self
            .gateway
            .unwrap_or_else(|| first_host(address, self.mask));
        NetworkInfo::new(address, self.mask, gateway)
    }
}

impl NetworkInfoSource for HostNetworkInfo {
    fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
        let address = detect_local_ipv4().ok_or(NetworkError::NoAddress)?;
        Ok(self.describe(address))
    }
}

/// Hostname setter that leaves the host's name alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostHostname;

impl HostnameSetter for HostHostname {
    fn set_hostname(&self, hostname: &str) -> Result<(), NetworkError> {
        info!("Host network: node hostname is {:?} (OS hostname unchanged)", hostname);
        Ok(())
    }
}

/// First usable host address of the subnet containing `address`.
fn first_host(address: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    let network = u32::from(address) & u32::from(mask);
    Ipv4Addr::from(network.wrapping_add(1))
}

/// Get the primary local IPv4 address.
///
/// This uses a trick: create a UDP socket and "connect" to a public IP
/// (doesn't actually send anything), then check which local address was chosen.
fn detect_local_ipv4() -> Option<Ipv4Addr> {
    use std::net::UdpSocket;

    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityState;

    #[test]
    fn test_first_host() {
        assert_eq!(
            first_host(Ipv4Addr::new(192, 168, 1, 10), Ipv4Addr::new(255, 255, 255, 0)),
            Ipv4Addr::new(192, 168, 1, 1)
        );
        assert_eq!(
            first_host(Ipv4Addr::new(10, 20, 30, 40), Ipv4Addr::new(255, 0, 0, 0)),
            Ipv4Addr::new(10, 0, 0, 1)
        );
    }

    #[test]
    fn test_describe_uses_configured_gateway() {
        let network = HostNetwork::new()
            .with_mask(Ipv4Addr::new(255, 255, 0, 0))
            .with_gateway(Ipv4Addr::new(172, 16, 0, 254));
        let info = network.info_source().describe(Ipv4Addr::new(172, 16, 4, 2));
        assert_eq!(info.mask, Ipv4Addr::new(255, 255, 0, 0));
        assert_eq!(info.gateway, Ipv4Addr::new(172, 16, 0, 254));
    }

    #[test]
    fn test_start_station_drives_state_machine() {
        let machine = Arc::new(ConnectivityStateMachine::new(
            "iotnode",
            Box::new(HostHostname),
        ));
        let mut network = HostNetwork::new();
        network.subscribe(machine.clone()).unwrap();
        let station = StationConfig::new("TestNetwork", "password123").unwrap();
        network.start_station(&station).unwrap();

        // Depends on whether this machine has a route; both outcomes are valid
        let state = machine.state();
        assert!(
            state == ConnectivityState::AddressAcquired
                || state == ConnectivityState::Disconnected
        );
        assert_eq!(machine.is_ready(), state.is_ready());
    }
}
