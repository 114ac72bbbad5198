//! IoT node firmware library.
//!
//! A Wi-Fi station that serves CoAP resources with per-request content
//! negotiation (text, JSON, CBOR) once it holds an address, and blinks a
//! liveness LED whose rate shows connectivity.
//!
//! Everything except the ESP-IDF glue ([`wifi`], [`output::GpioOutput`]) is
//! platform-independent and tested on the host.

pub mod codec;
pub mod config;
pub mod connectivity;
pub mod credentials;
pub mod engine;
pub mod indicator;
pub mod network;
pub mod node;
pub mod output;
pub mod resource;
#[cfg(feature = "esp32")]
pub mod wifi;

// Re-export commonly used items
pub use codec::{ContentFormat, Encoded};
pub use config::{NodeConfig, StationConfig};
pub use connectivity::{ConnectivityState, ConnectivityStateMachine, GateSignal, NetworkEvent};
pub use credentials::CredentialMaterial;
pub use engine::{ProtocolEngine, UdpCoapEngine};
pub use node::{BootError, Node, NodeOrchestrator};
pub use resource::{LedResource, NetworkInfoResource, ResourceRegistry};
