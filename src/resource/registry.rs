//! Resource registry and request routing.

use super::{Method, Request, Resource, ResourceError, Response, ResponseCode};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

/// Owns every resource of the node, keyed by path.
///
/// Populated once during boot, then shared read-only (behind an `Arc`) with
/// the protocol engine.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: BTreeMap<String, Box<dyn Resource>>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its path.
    ///
    /// Fails with [`RegistryError::DuplicatePath`] if the path is taken; the
    /// existing registration is kept.
    pub fn register(&mut self, resource: Box<dyn Resource>) -> Result<(), RegistryError> {
        let path = resource.path();
        if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
            return Err(RegistryError::InvalidPath(path.to_string()));
        }
        if self.resources.contains_key(path) {
            return Err(RegistryError::DuplicatePath(path.to_string()));
        }
        debug!("Registered resource {} ({})", path, resource.description());
        self.resources.insert(path.to_string(), resource);
        Ok(())
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Look up a resource by exact path.
    pub fn get(&self, path: &str) -> Option<&dyn Resource> {
        self.resources.get(path).map(|r| r.as_ref())
    }

    /// Registered paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Route a request to its resource.
    pub fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        let resource = self
            .get(&request.path)
            .ok_or_else(|| DispatchError::NotFound(request.path.clone()))?;

        if !resource.allowed_methods().contains(request.method) {
            return Err(DispatchError::MethodNotAllowed {
                path: request.path.clone(),
                method: request.method,
            });
        }

        resource.handle(request).map_err(DispatchError::Handler)
    }

    /// Route a request and convert any failure into an error response.
    pub fn serve(&self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    DispatchError::Handler(inner) => {
                        warn!("{} {} failed: {}", request.method, request.path, inner)
                    }
                    _ => debug!("{} {} rejected: {}", request.method, request.path, e),
                }
                Response::diagnostic(e.response_code(), &e)
            }
        }
    }

    /// CoRE link-format document (RFC 6690) describing every resource.
    pub fn link_format(&self) -> String {
        let mut doc = String::new();
        for (index, resource) in self.resources.values().enumerate() {
            if index > 0 {
                doc.push(',');
            }
            let formats: Vec<String> = resource
                .content_formats()
                .iter()
                .map(|format| format.code().to_string())
                .collect();
            let _ = write!(
                doc,
                "</{}>;title=\"{}\";ct=\"{}\"",
                resource.path(),
                resource.description(),
                formats.join(" ")
            );
        }
        doc
    }
}

impl fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.resources.keys()).finish()
    }
}

/// Errors raised while registering resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Another resource already uses this path.
    DuplicatePath(String),
    /// Path is empty or has a leading/trailing slash.
    InvalidPath(String),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePath(path) => write!(f, "duplicate resource path: {}", path),
            Self::InvalidPath(path) => write!(f, "invalid resource path: {:?}", path),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Reasons a request could not be answered with a success response.
#[derive(Debug)]
pub enum DispatchError {
    /// No resource at this path.
    NotFound(String),
    /// Resource exists but does not answer this method.
    MethodNotAllowed { path: String, method: Method },
    /// The resource handler failed.
    Handler(ResourceError),
}

impl DispatchError {
    /// CoAP response code for this failure.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            Self::NotFound(_) => ResponseCode::NotFound,
            Self::MethodNotAllowed { .. } => ResponseCode::MethodNotAllowed,
            Self::Handler(e) => e.response_code(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "no resource at {}", path),
            Self::MethodNotAllowed { path, method } => {
                write!(f, "{} not allowed on {}", method, path)
            }
            Self::Handler(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handler(e) => Some(e),
            _ => None,
        }
    }
}
