//! Plain CoAP (RFC 7252) over UDP.
//!
//! Message parsing and serialization are done by `coap-lite`; this module
//! only converts between its packets and the node's [`Request`]/[`Response`]
//! and runs the receive loop. The loop is parked while the gate is cleared.
//!
//! DTLS is not provided here: `init` refuses `use_secure_transport`.

use super::{EngineError, ProtocolEngine, TransportOptions};
use crate::connectivity::GateSignal;
use crate::resource::{Method, Request, ResourceRegistry, Response, ResponseCode};
use coap_lite::{
    CoapOption, CoapResponse, MessageClass, MessageType, Packet, RequestType, ResponseType,
};
use log::{debug, error, info, warn};
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Resource discovery path (RFC 6690).
pub const WELL_KNOWN_CORE: &str = ".well-known/core";

/// CoAP Content-Format for `application/link-format`.
const LINK_FORMAT: u16 = 40;

/// Receive poll interval; bounds shutdown latency.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Largest datagram accepted (CoAP over IPv4 without blockwise).
const MAX_DATAGRAM: usize = 1152;

/// Pause after a socket error before receiving again.
const ERROR_BACKOFF: Duration = Duration::from_millis(250);

/// Socket operations used by the receive loop.
trait DatagramSocket {
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
    fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<usize>;
}

impl DatagramSocket for UdpSocket {
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }

    fn send_to(&self, buf: &[u8], peer: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, peer)
    }
}

/// CoAP engine serving a registry over a UDP socket.
pub struct UdpCoapEngine {
    bind: SocketAddr,
    gate: Option<GateSignal>,
}

impl UdpCoapEngine {
    /// Create an engine that will bind to `bind` on start.
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind, gate: None }
    }
}

impl ProtocolEngine for UdpCoapEngine {
    type Handle = EngineHandle;

    fn init(&mut self, options: TransportOptions<'_>, gate: GateSignal) -> Result<(), EngineError> {
        if options.use_secure_transport {
            return Err(EngineError::Unsupported("DTLS transport"));
        }
        info!(
            "CoAP engine initialized (NoSec, {} byte cert and {} byte key unused)",
            options.cert_len(),
            options.key_len()
        );
        self.gate = Some(gate);
        Ok(())
    }

    fn start(&mut self, registry: Arc<ResourceRegistry>) -> Result<EngineHandle, EngineError> {
        let gate = self.gate.clone().ok_or(EngineError::NotInitialized)?;

        let socket = UdpSocket::bind(self.bind)?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;
        info!("CoAP engine listening on coap://{}", local_addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("coap".into())
            .spawn(move || serve(socket, registry, gate, shutdown_clone))?;

        Ok(EngineHandle {
            handle: Some(handle),
            shutdown,
            local_addr,
        })
    }
}

/// Running engine. Drop it to stop serving.
pub struct EngineHandle {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

impl EngineHandle {
    /// Address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the receive loop and wait for it to exit.
    ///
    /// May take up to one poll interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Receive loop. Only `shutdown` ends it; socket errors are logged once
/// per failure streak and retried after [`ERROR_BACKOFF`].
fn serve<S: DatagramSocket>(
    socket: S,
    registry: Arc<ResourceRegistry>,
    gate: GateSignal,
    shutdown: Arc<AtomicBool>,
) {
    let mut buf = [0u8; MAX_DATAGRAM];
    let mut failing = false;

    loop {
        if shutdown.load(Ordering::Acquire) {
            info!("CoAP engine shutting down");
            break;
        }

        if !gate.wait_set_timeout(POLL_INTERVAL) {
            continue;
        }

        match socket.recv_from(&mut buf) {
            Ok((len, peer)) => {
                if failing {
                    info!("CoAP socket recovered");
                    failing = false;
                }
                let Some(reply) = handle_datagram(&registry, &buf[..len]) else {
                    continue;
                };
                if let Err(e) = socket.send_to(&reply, peer) {
                    warn!("Failed to send response to {}: {}", peer, e);
                }
            }
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                if !failing {
                    error!("CoAP socket error: {}", e);
                    failing = true;
                }
                thread::sleep(ERROR_BACKOFF);
            }
        }
    }
}

/// Answer one inbound datagram. `None` means nothing is sent back.
pub(crate) fn handle_datagram(registry: &ResourceRegistry, datagram: &[u8]) -> Option<Vec<u8>> {
    let packet = match Packet::from_bytes(datagram) {
        Ok(packet) => packet,
        Err(e) => {
            debug!("Dropping malformed datagram: {:?}", e);
            return None;
        }
    };
    let request_type = match packet.header.code {
        MessageClass::Request(request_type) => request_type,
        MessageClass::Empty if packet.header.get_type() == MessageType::Confirmable => {
            // CoAP ping (RFC 7252 §4.3)
            return reset(&packet);
        }
        _ => return None,
    };
    // Non-confirmable and confirmable requests only
    let mut reply = CoapResponse::new(&packet)?;

    let (response, format) = match to_request(&packet, request_type) {
        Some(request) if request.path == WELL_KNOWN_CORE => discovery(registry, &request),
        Some(request) => {
            let response = registry.serve(&request);
            let format = response.content_format.map(|format| format.code());
            (response, format)
        }
        None => (Response::empty(ResponseCode::MethodNotAllowed), None),
    };
    debug!("{:?} {} -> {}", request_type, uri_path(&packet), response.code);

    reply.set_status(response_type(response.code));
    if let Some(format) = format {
        reply
            .message
            .add_option(CoapOption::ContentFormat, encode_uint(format));
    }
    reply.message.payload = response.payload;

    match reply.message.to_bytes() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!("Failed to serialize response: {:?}", e);
            None
        }
    }
}

/// Empty Reset echoing the message ID of `packet`.
fn reset(packet: &Packet) -> Option<Vec<u8>> {
    let mut reply = Packet::new();
    reply.header.set_type(MessageType::Reset);
    reply.header.code = MessageClass::Empty;
    reply.header.message_id = packet.header.message_id;
    reply.to_bytes().ok()
}

/// Discovery response and its Content-Format (link-format, not one of the
/// negotiable representation formats).
fn discovery(registry: &ResourceRegistry, request: &Request) -> (Response, Option<u16>) {
    if request.method != Method::Get {
        return (Response::empty(ResponseCode::MethodNotAllowed), None);
    }
    let response = Response {
        code: ResponseCode::Content,
        content_format: None,
        payload: registry.link_format().into_bytes(),
    };
    (response, Some(LINK_FORMAT))
}

fn to_request(packet: &Packet, request_type: RequestType) -> Option<Request> {
    let method = match request_type {
        RequestType::Get => Method::Get,
        RequestType::Post => Method::Post,
        RequestType::Put => Method::Put,
        RequestType::Delete => Method::Delete,
        _ => return None,
    };
    Some(Request {
        path: uri_path(packet),
        method,
        accept: uint_option(packet, CoapOption::Accept),
        content_format: uint_option(packet, CoapOption::ContentFormat),
        payload: packet.payload.clone(),
    })
}

fn uri_path(packet: &Packet) -> String {
    packet
        .get_option(CoapOption::UriPath)
        .map(|segments| {
            segments
                .iter()
                .map(|segment| String::from_utf8_lossy(segment).into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// First value of a uint option (RFC 7252 §3.2: big-endian, shortest form).
fn uint_option(packet: &Packet, option: CoapOption) -> Option<u16> {
    let value = packet.get_option(option)?.front()?;
    if value.len() > 2 {
        // Larger than any registered format; force a 4.02
        return Some(u16::MAX);
    }
    Some(value.iter().fold(0u16, |acc, byte| (acc << 8) | u16::from(*byte)))
}

fn encode_uint(value: u16) -> Vec<u8> {
    match value {
        0 => Vec::new(),
        1..=0xFF => vec![value as u8],
        _ => value.to_be_bytes().to_vec(),
    }
}

fn response_type(code: ResponseCode) -> ResponseType {
    match code {
        ResponseCode::Changed => ResponseType::Changed,
        ResponseCode::Content => ResponseType::Content,
        ResponseCode::BadRequest => ResponseType::BadRequest,
        ResponseCode::BadOption => ResponseType::BadOption,
        ResponseCode::NotFound => ResponseType::NotFound,
        ResponseCode::MethodNotAllowed => ResponseType::MethodNotAllowed,
        ResponseCode::InternalServerError => ResponseType::InternalServerError,
        ResponseCode::ServiceUnavailable => ResponseType::ServiceUnavailable,
    }
}
