//! Host-based IoT node for development and testing.
//!
//! Runs the full node on the host machine (not ESP32): the OS network stands
//! in for the Wi-Fi station, the LEDs are in-memory, and CoAP is served
//! without DTLS.
//!
//! # Usage
//!
//! ```bash
//! IOTNODE_CERT_PATH=certs/iotnode.crt IOTNODE_KEY_PATH=certs/iotnode.key \
//!     cargo run --bin host-node
//!
//! coap-client -m get -A 50 coap://localhost/wifi/ipconfig
//! ```
//!
//! # Environment
//!
//! - `IOTNODE_CERT_PATH`, `IOTNODE_KEY_PATH` - credential files (required)
//! - `IOTNODE_HOSTNAME` - node hostname (default `iotnode`)
//! - `IOTNODE_COAP_PORT` - UDP port (default 5683)

#[cfg(not(feature = "esp32"))]
fn main() {
    use iotnode_esp32::config::{ConfigError, NodeConfig, StationConfig};
    use iotnode_esp32::network::{HostHostname, HostNetwork};
    use iotnode_esp32::output::MemoryOutput;
    use iotnode_esp32::resource::{LedResource, NetworkInfoResource};
    use iotnode_esp32::{CredentialMaterial, NodeOrchestrator, UdpCoapEngine};
    use log::{error, info};
    use std::net::{Ipv4Addr, SocketAddr};

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== IoT Host Node starting ===");

    let config = match host_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let (cert_path, key_path) = match (
        std::env::var("IOTNODE_CERT_PATH"),
        std::env::var("IOTNODE_KEY_PATH"),
    ) {
        (Ok(cert), Ok(key)) => (cert, key),
        _ => {
            error!("IOTNODE_CERT_PATH and IOTNODE_KEY_PATH must point at credential files");
            std::process::exit(1);
        }
    };

    let network = HostNetwork::new();
    let led = MemoryOutput::new("led");
    let engine = UdpCoapEngine::new(SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.coap_port)));

    let node = NodeOrchestrator::new(config)
        .with_resource(NetworkInfoResource::new(network.info_source()))
        .with_resource(LedResource::new(led))
        .boot(
            || CredentialMaterial::from_files(&cert_path, &key_path),
            engine,
            network,
            Box::new(HostHostname),
        );

    match node {
        Ok(node) => {
            info!("Node ready, state {} (Ctrl+C to exit)", node.state());
            node.run_indicator(MemoryOutput::new("status"))
        }
        Err(e) => {
            error!("Boot failed: {}", e);
            std::process::exit(1);
        }
    }

    fn host_config() -> Result<NodeConfig, ConfigError> {
        let hostname = std::env::var("IOTNODE_HOSTNAME").unwrap_or_else(|_| "iotnode".into());
        // The host OS owns association
        let station = StationConfig::open("host")?;
        let config = NodeConfig::new(hostname, station, false)?;
        match std::env::var("IOTNODE_COAP_PORT") {
            Ok(port) => {
                let port = port
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber(port.clone()))?;
                Ok(config.with_port(port))
            }
            Err(_) => Ok(config),
        }
    }
}

#[cfg(feature = "esp32")]
fn main() {
    println!("host-node runs on the host only; build without the 'esp32' feature.");
}
