//! Node orchestration: boot sequence and the liveness loop.
//!
//! Boot runs these steps in order; the first failure aborts with a
//! [`BootError`] naming the step:
//!
//! 1. Load credential material and record its size.
//! 2. Initialize the protocol engine with the credentials and the gate.
//! 3. Register every resource, then start the engine against the registry.
//! 4. Subscribe the connectivity state machine to network events.
//! 5. Start the station with the configured SSID and passphrase.
//!
//! The caller then hands an output line to [`Node::run_indicator`], which
//! never returns.
//!
//! # Example
//!
//! ```ignore
//! let node = NodeOrchestrator::new(config)
//!     .with_resource(NetworkInfoResource::new(network.info_source()))
//!     .with_resource(LedResource::new(led))
//!     .boot(load_credentials, engine, network, Box::new(HostHostname))?;
//! node.run_indicator(status_led)
//! ```

use crate::config::NodeConfig;
use crate::connectivity::{ConnectivityState, ConnectivityStateMachine, GateSignal};
use crate::credentials::{CredentialError, CredentialMaterial};
use crate::engine::{EngineError, ProtocolEngine, TransportOptions};
use crate::indicator::LivenessIndicator;
use crate::network::{HostnameSetter, NetworkDriver, NetworkError};
use crate::output::OutputLine;
use crate::resource::{RegistryError, Resource, ResourceRegistry};
use log::info;
use std::fmt;
use std::sync::Arc;

/// Collects configuration and resources, then boots the node.
pub struct NodeOrchestrator {
    config: NodeConfig,
    resources: Vec<Box<dyn Resource>>,
}

impl NodeOrchestrator {
    /// Start describing a node.
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            resources: Vec::new(),
        }
    }

    /// Add a resource to be registered at boot.
    pub fn with_resource(mut self, resource: impl Resource + 'static) -> Self {
        self.resources.push(Box::new(resource));
        self
    }

    /// Run the boot sequence.
    pub fn boot<E, D, F>(
        self,
        load_credentials: F,
        mut engine: E,
        mut driver: D,
        hostname_setter: Box<dyn HostnameSetter>,
    ) -> Result<Node<E, D>, BootError>
    where
        E: ProtocolEngine,
        D: NetworkDriver,
        F: FnOnce() -> Result<CredentialMaterial, CredentialError>,
    {
        let credentials = load_credentials().map_err(BootError::Credentials)?;
        info!(
            "Credentials loaded: certificate {} bytes, key {} bytes",
            credentials.cert_len(),
            credentials.key_len()
        );

        let machine = Arc::new(ConnectivityStateMachine::new(
            self.config.hostname.clone(),
            hostname_setter,
        ));

        let options = TransportOptions::new(self.config.use_secure_transport, &credentials);
        engine
            .init(options, machine.gate())
            .map_err(BootError::Engine)?;

        let mut registry = ResourceRegistry::new();
        for resource in self.resources {
            registry.register(resource).map_err(BootError::Registry)?;
        }
        info!("Registered {} resources: {:?}", registry.len(), registry);
        let registry = Arc::new(registry);
        let engine_handle = engine.start(registry.clone()).map_err(BootError::Engine)?;

        let subscription = driver
            .subscribe(machine.clone())
            .map_err(BootError::Network)?;

        info!("Starting station, SSID {:?}", self.config.station.ssid());
        driver
            .start_station(&self.config.station)
            .map_err(BootError::Network)?;

        Ok(Node {
            config: self.config,
            credentials,
            registry,
            machine,
            engine: engine_handle,
            _subscription: subscription,
            _driver: driver,
        })
    }
}

/// A booted node. Dropping it stops the engine and the event subscription.
pub struct Node<E: ProtocolEngine, D: NetworkDriver> {
    config: NodeConfig,
    credentials: CredentialMaterial,
    registry: Arc<ResourceRegistry>,
    machine: Arc<ConnectivityStateMachine>,
    engine: E::Handle,
    _subscription: D::Subscription,
    _driver: D,
}

impl<E: ProtocolEngine, D: NetworkDriver> Node<E, D> {
    /// Configuration the node booted with.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Credential material lent to the engine.
    pub fn credentials(&self) -> &CredentialMaterial {
        &self.credentials
    }

    /// Registry served by the engine.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Running engine handle.
    pub fn engine(&self) -> &E::Handle {
        &self.engine
    }

    /// Current connectivity state.
    pub fn state(&self) -> ConnectivityState {
        self.machine.state()
    }

    /// Connectivity gate.
    pub fn gate(&self) -> GateSignal {
        self.machine.gate()
    }

    /// Blink `output` forever, keeping the node alive.
    pub fn run_indicator<O: OutputLine>(self, output: O) -> ! {
        info!("Entering liveness loop");
        let indicator = LivenessIndicator::new(output, self.gate());
        let _node = self;
        indicator.run()
    }
}

/// Fatal boot failures.
#[derive(Debug)]
pub enum BootError {
    /// Step 1: credential material missing or unreadable.
    Credentials(CredentialError),
    /// Steps 2-3: engine refused its options or could not start.
    Engine(EngineError),
    /// Step 3: resource registration conflict.
    Registry(RegistryError),
    /// Steps 4-5: event subscription or station start failed.
    Network(NetworkError),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials(e) => write!(f, "credentials: {}", e),
            Self::Engine(e) => write!(f, "protocol engine: {}", e),
            Self::Registry(e) => write!(f, "resource registration: {}", e),
            Self::Network(e) => write!(f, "network: {}", e),
        }
    }
}

impl std::error::Error for BootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Credentials(e) => Some(e),
            Self::Engine(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::Network(e) => Some(e),
        }
    }
}
