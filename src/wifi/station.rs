//! Station-mode driver over `EspWifi`.

use crate::config::StationConfig;
use crate::connectivity::{ConnectivityStateMachine, NetworkEvent};
use crate::network::{HostnameSetter, NetworkDriver, NetworkError, NetworkInfo, NetworkInfoSource};
use esp_idf_hal::modem::Modem;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_svc::eventloop::{EspSubscription, EspSystemEventLoop, System};
use esp_idf_svc::netif::IpEvent;
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiEvent};
use log::info;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

type SharedWifi = Arc<Mutex<EspWifi<'static>>>;

fn lock(wifi: &SharedWifi) -> MutexGuard<'_, EspWifi<'static>> {
    match wifi.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Wi-Fi station driver.
///
/// Credentials are kept in RAM only; nothing is written to NVS.
pub struct WifiStation {
    wifi: SharedWifi,
    sysloop: EspSystemEventLoop,
}

impl WifiStation {
    /// Take the modem and create the driver.
    pub fn new(
        modem: impl Peripheral<P = Modem> + 'static,
        sysloop: EspSystemEventLoop,
    ) -> Result<Self, NetworkError> {
        let wifi = EspWifi::new(modem, sysloop.clone(), None)?;
        Ok(Self {
            wifi: Arc::new(Mutex::new(wifi)),
            sysloop,
        })
    }

    /// Hostname setter bound to this station's netif.
    pub fn hostname_setter(&self) -> StationHostname {
        StationHostname {
            wifi: self.wifi.clone(),
        }
    }

    /// Live network info source bound to this station's netif.
    pub fn info_source(&self) -> StationInfo {
        StationInfo {
            wifi: self.wifi.clone(),
        }
    }
}

/// Wi-Fi and IP event subscriptions; dropping it unsubscribes both.
pub struct WifiSubscription {
    _wifi: EspSubscription<'static, System>,
    _ip: EspSubscription<'static, System>,
}

impl NetworkDriver for WifiStation {
    type Subscription = WifiSubscription;

    fn subscribe(
        &mut self,
        machine: Arc<ConnectivityStateMachine>,
    ) -> Result<WifiSubscription, NetworkError> {
        let wifi_machine = machine.clone();
        let wifi = self.sysloop.subscribe::<WifiEvent, _>(move |event| {
            let event = match event {
                WifiEvent::StaStarted => NetworkEvent::StationStart,
                WifiEvent::StaConnected(_) => NetworkEvent::StationLinkUp,
                WifiEvent::StaDisconnected(_) => NetworkEvent::StationDisconnected,
                _ => NetworkEvent::Unhandled("wifi"),
            };
            wifi_machine.handle_event(event);
        })?;

        let ip = self.sysloop.subscribe::<IpEvent, _>(move |event| {
            let event = match event {
                IpEvent::DhcpIpAssigned(_) => NetworkEvent::AddressAcquired,
                _ => NetworkEvent::Unhandled("ip"),
            };
            machine.handle_event(event);
        })?;

        Ok(WifiSubscription {
            _wifi: wifi,
            _ip: ip,
        })
    }

    fn start_station(&mut self, station: &StationConfig) -> Result<(), NetworkError> {
        let auth_method = if station.is_open() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };

        let config = Configuration::Client(ClientConfiguration {
            ssid: station
                .ssid()
                .try_into()
                .map_err(|_| NetworkError::InvalidCredentials("SSID".into()))?,
            password: station
                .password()
                .try_into()
                .map_err(|_| NetworkError::InvalidCredentials("password".into()))?,
            auth_method,
            ..Default::default()
        });

        let mut wifi = lock(&self.wifi);
        wifi.set_configuration(&config)?;
        wifi.start()?;
        // Association and DHCP complete asynchronously as events
        wifi.connect()?;
        info!("Wi-Fi station started");
        Ok(())
    }
}

/// Sets the hostname on the station netif.
#[derive(Clone)]
pub struct StationHostname {
    wifi: SharedWifi,
}

impl HostnameSetter for StationHostname {
    fn set_hostname(&self, hostname: &str) -> Result<(), NetworkError> {
        lock(&self.wifi)
            .sta_netif_mut()
            .set_hostname(hostname)
            .map_err(|e| NetworkError::Hostname(format!("{:?}", e)))
    }
}

/// Reads the station netif's current IPv4 configuration.
#[derive(Clone)]
pub struct StationInfo {
    wifi: SharedWifi,
}

impl NetworkInfoSource for StationInfo {
    fn network_info(&self) -> Result<NetworkInfo, NetworkError> {
        let ip_info = lock(&self.wifi).sta_netif().get_ip_info()?;
        if ip_info.ip.is_unspecified() {
            return Err(NetworkError::NoAddress);
        }
        Ok(NetworkInfo::new(
            ip_info.ip,
            Ipv4Addr::from(ip_info.subnet.mask),
            ip_info.subnet.gateway,
        ))
    }
}
