//! Transport Layer
//!
//! Responsibilities:
//! - Move raw datagrams between this endpoint and its peer
//! - Hide whether the peer address is configured (client) or learned (server)
//! - NO obfuscation, NO framing, NO retries
//!
//! Each `read`/`write` corresponds to exactly one datagram.

mod udp;

pub use udp::{UdpTransport, UdpTransportOptions, DEFAULT_UDP_MTU};

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use async_trait::async_trait;
use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which side of the exchange a transport plays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Listen on the server address and learn the peer from inbound packets
    Server,
    /// Connect to the server address; the peer is fixed
    #[default]
    Client,
}

impl Mode {
    pub fn is_server(&self) -> bool {
        matches!(self, Mode::Server)
    }
}

impl From<bool> for Mode {
    fn from(is_server: bool) -> Self {
        if is_server {
            Mode::Server
        } else {
            Mode::Client
        }
    }
}

/// Transport trait for datagram channels
///
/// `open` takes `&mut self` and happens before the transport is shared.
/// Everything else takes `&self` so one task can block in `read` while
/// others `write` or `close`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Decode options, resolve addresses and bind or connect
    async fn open(&mut self, mode: Mode, options: &serde_json::Value) -> Result<()>;

    /// Release the socket, waking any pending `read`
    async fn close(&self) -> Result<()>;

    /// Largest datagram this transport carries in one unit
    fn mtu(&self) -> usize;

    /// Networks this transport exclusively reaches
    fn wire_networks(&self) -> Vec<IpNet>;

    /// Get the local bound address
    fn local_addr(&self) -> Result<SocketAddr>;

    /// Receive one datagram
    async fn read(&self, buf: &mut [u8]) -> Result<usize>;

    /// Send one datagram; `Ok(0)` when there is nobody to send to yet
    async fn write(&self, buf: &[u8]) -> Result<usize>;

    /// Registry name of this variant
    fn name(&self) -> &'static str;
}

/// Transport variants selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Udp,
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "udp" => Ok(TransportKind::Udp),
            other => Err(Error::Config(format!("unknown transport type: {}", other))),
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Udp => f.write_str("udp"),
        }
    }
}

/// Create an unopened transport of the given kind
pub fn create_transport(kind: TransportKind) -> Box<dyn Transport> {
    match kind {
        TransportKind::Udp => Box::new(UdpTransport::new()),
    }
}
