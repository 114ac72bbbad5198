//! IoT node ESP32 firmware binary.
//!
//! GPIO4 is the liveness LED, GPIO2 the `actuators/led` actuator.

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_sys::link_patches();

    // Initialize ESP-IDF logger for log crate integration
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("=== IoT node starting ===");

    if let Err(e) = firmware::run() {
        log::error!("Boot failed: {}", e);
        // No recovery path for a mis-provisioned node; stay up for the log
        loop {
            std::thread::sleep(std::time::Duration::from_secs(60));
        }
    }
}

#[cfg(feature = "esp32")]
mod firmware {
    use esp_idf_hal::gpio::OutputPin;
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use iotnode_esp32::config::NodeConfig;
    use iotnode_esp32::output::GpioOutput;
    use iotnode_esp32::resource::{LedResource, NetworkInfoResource};
    use iotnode_esp32::wifi::WifiStation;
    use iotnode_esp32::{CredentialMaterial, NodeOrchestrator, UdpCoapEngine};
    use std::error::Error;
    use std::net::{Ipv4Addr, SocketAddr};

    static CERTIFICATE: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/", env!("IOTNODE_CERT_PATH")));
    static PRIVATE_KEY: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/", env!("IOTNODE_KEY_PATH")));

    /// Boot the node; only returns on failure.
    pub fn run() -> Result<(), Box<dyn Error>> {
        let config = NodeConfig::from_build_env()?;
        let peripherals = Peripherals::take()?;
        let sysloop = EspSystemEventLoop::take()?;

        let status_led = GpioOutput::new(peripherals.pins.gpio4.downgrade_output())?;
        let led = GpioOutput::new(peripherals.pins.gpio2.downgrade_output())?;

        let station = WifiStation::new(peripherals.modem, sysloop)?;
        let hostname = station.hostname_setter();
        let engine = UdpCoapEngine::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.coap_port)));

        let node = NodeOrchestrator::new(config)
            .with_resource(NetworkInfoResource::new(station.info_source()))
            .with_resource(LedResource::new(led))
            .boot(
                || CredentialMaterial::embedded(CERTIFICATE, PRIVATE_KEY),
                engine,
                station,
                Box::new(hostname),
            )?;

        node.run_indicator(status_led)
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo run --bin host-node' to run the node on the host.");
}
