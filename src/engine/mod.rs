//! Protocol engine boundary.
//!
//! The engine owns the wire: message framing, option parsing and (when
//! secured) the DTLS session. The node only initializes it with credential
//! material and the connectivity gate, then starts it against the resource
//! registry. Inbound requests reach [`ResourceRegistry::serve`]; discovery
//! (`.well-known/core`) is answered from [`ResourceRegistry::link_format`].
//!
//! - [`UdpCoapEngine`] - plain CoAP over UDP via `coap-lite`

mod udp;

pub use udp::{EngineHandle, UdpCoapEngine, WELL_KNOWN_CORE};

use crate::connectivity::GateSignal;
use crate::credentials::CredentialMaterial;
use crate::resource::ResourceRegistry;
use std::fmt;
use std::sync::Arc;

/// Options handed to the engine at initialization.
///
/// Credential bytes are borrowed from the orchestrator for the duration of
/// the call; engines that need them later must copy what they keep.
#[derive(Clone, Copy)]
pub struct TransportOptions<'a> {
    /// Require DTLS.
    pub use_secure_transport: bool,
    pub certificate: &'a [u8],
    pub private_key: &'a [u8],
}

impl<'a> TransportOptions<'a> {
    /// Borrow `credentials` for engine initialization.
    pub fn new(use_secure_transport: bool, credentials: &'a CredentialMaterial) -> Self {
        Self {
            use_secure_transport,
            certificate: credentials.certificate(),
            private_key: credentials.private_key(),
        }
    }

    /// Certificate length in bytes.
    pub fn cert_len(&self) -> usize {
        self.certificate.len()
    }

    /// Private key length in bytes.
    pub fn key_len(&self) -> usize {
        self.private_key.len()
    }
}

impl fmt::Debug for TransportOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportOptions")
            .field("use_secure_transport", &self.use_secure_transport)
            .field("cert_len", &self.cert_len())
            .field("key_len", &self.key_len())
            .finish()
    }
}

/// A request/response protocol engine.
pub trait ProtocolEngine {
    /// Keeps the engine running; dropping it stops the engine.
    type Handle;

    /// Prepare the engine. Traffic only flows while `gate` is set.
    fn init(&mut self, options: TransportOptions<'_>, gate: GateSignal) -> Result<(), EngineError>;

    /// Start serving `registry`.
    fn start(&mut self, registry: Arc<ResourceRegistry>) -> Result<Self::Handle, EngineError>;
}

/// Engine errors. All of them are fatal at boot.
#[derive(Debug)]
pub enum EngineError {
    /// Options the engine cannot honor.
    Unsupported(&'static str),
    /// `start` called before a successful `init`.
    NotInitialized,
    /// Socket or thread setup failed.
    Io(std::io::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(what) => write!(f, "unsupported: {}", what),
            Self::NotInitialized => write!(f, "engine not initialized"),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
