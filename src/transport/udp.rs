//! UDP Transport implementation
//!
//! A server binds the configured address and answers whoever wrote to it
//! last. A client connects to the configured address and only ever talks to
//! it. The peer cell is behind a lock so a reader task and a writer task can
//! share one transport.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use ipnet::IpNet;
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, trace};

use crate::common::Address;
use crate::config::decode_options;
use crate::error::{Error, Result};

use super::{Mode, Transport};

/// MTU used when none is configured
pub const DEFAULT_UDP_MTU: usize = 1450;

/// Options accepted by [`UdpTransport::open`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UdpTransportOptions {
    /// `host:port` to listen on (server) or send to (client)
    pub server_addr: String,

    /// Local `host:port` for the client socket; empty lets the OS choose
    #[serde(default)]
    pub client_addr: String,

    /// Any JSON number; absent or below 1 means [`DEFAULT_UDP_MTU`]
    #[serde(default)]
    pub mtu: Option<f64>,
}

impl UdpTransportOptions {
    fn effective_mtu(&self) -> usize {
        match self.mtu {
            Some(mtu) if mtu >= 1.0 => mtu as usize,
            _ => DEFAULT_UDP_MTU,
        }
    }
}

/// UDP transport
pub struct UdpTransport {
    socket: Mutex<Option<Arc<UdpSocket>>>,
    /// Fixed at open for clients, last sender for servers
    peer: Mutex<Option<SocketAddr>>,
    mode: Mode,
    mtu: usize,
    closed: watch::Sender<bool>,
}

impl UdpTransport {
    pub fn new() -> Self {
        Self {
            socket: Mutex::new(None),
            peer: Mutex::new(None),
            mode: Mode::default(),
            mtu: DEFAULT_UDP_MTU,
            closed: watch::channel(false).0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Current peer, if any
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        *self.peer.lock()
    }

    fn socket(&self) -> Result<Arc<UdpSocket>> {
        match self.socket.lock().as_ref() {
            Some(socket) => Ok(socket.clone()),
            None if *self.closed.borrow() => Err(Error::ConnectionClosed),
            None => Err(Error::NotOpen),
        }
    }

    fn learn_peer(&self, from: SocketAddr) {
        let mut peer = self.peer.lock();
        if *peer != Some(from) {
            debug!("UDP peer changed: {:?} -> {}", *peer, from);
            *peer = Some(from);
        }
    }
}

impl Default for UdpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UdpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.peer_addr() {
            Some(peer) => write!(f, "UDP[{}]", peer),
            None => write!(f, "UDP[none]"),
        }
    }
}

async fn resolve(addr: &str) -> Result<SocketAddr> {
    Address::parse(addr)?.resolve().await
}

fn resolve_error(which: &str, addr: &str, err: Error) -> Error {
    match err {
        Error::Resolve(msg) => Error::Resolve(format!("resolving {} addr {:?}: {}", which, addr, msg)),
        other => other,
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn open(&mut self, mode: Mode, options: &serde_json::Value) -> Result<()> {
        if self.socket.get_mut().is_some() {
            return Err(Error::Config("UDP transport is already open".into()));
        }

        let opts: UdpTransportOptions = decode_options("udp transport", options)?;
        let mtu = opts.effective_mtu();

        let server_addr = resolve(&opts.server_addr)
            .await
            .map_err(|e| resolve_error("server", &opts.server_addr, e))?;

        let client_addr = if !mode.is_server() && !opts.client_addr.is_empty() {
            Some(
                resolve(&opts.client_addr)
                    .await
                    .map_err(|e| resolve_error("client", &opts.client_addr, e))?,
            )
        } else {
            None
        };

        let (socket, peer) = match mode {
            Mode::Server => {
                info!("Listening on UDP {}", server_addr);
                let socket = UdpSocket::bind(server_addr)
                    .await
                    .map_err(|e| Error::Socket(format!("listening UDP on {}: {}", server_addr, e)))?;
                (socket, None)
            }
            Mode::Client => {
                let local = client_addr.unwrap_or_else(|| Address::unspecified_for(&server_addr));
                info!("Dialing UDP {} from {}", server_addr, local);
                let socket = UdpSocket::bind(local)
                    .await
                    .map_err(|e| Error::Socket(format!("dialing UDP from {}: {}", local, e)))?;
                socket
                    .connect(server_addr)
                    .await
                    .map_err(|e| Error::Socket(format!("dialing UDP to {}: {}", server_addr, e)))?;
                (socket, Some(server_addr))
            }
        };

        self.mode = mode;
        self.mtu = mtu;
        *self.peer.get_mut() = peer;
        *self.socket.get_mut() = Some(Arc::new(socket));
        self.closed.send_replace(false);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let socket = self.socket.lock().take();
        if socket.is_some() {
            self.closed.send_replace(true);
            debug!("Closed {}", self);
        }
        Ok(())
    }

    fn mtu(&self) -> usize {
        self.mtu
    }

    fn wire_networks(&self) -> Vec<IpNet> {
        if self.mode.is_server() {
            return Vec::new();
        }
        self.peer_addr()
            .map(|peer| vec![IpNet::from(peer.ip())])
            .unwrap_or_default()
    }

    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket()?.local_addr()?)
    }

    async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let socket = self.socket()?;
        let mut closed = self.closed.subscribe();
        let already_closed = *closed.borrow_and_update();
        if already_closed {
            return Err(Error::ConnectionClosed);
        }

        tokio::select! {
            res = socket.recv_from(buf) => {
                let (n, from) = res?;
                if self.mode.is_server() {
                    self.learn_peer(from);
                }
                Ok(n)
            }
            _ = closed.wait_for(|closed| *closed) => Err(Error::ConnectionClosed),
        }
    }

    async fn write(&self, buf: &[u8]) -> Result<usize> {
        let socket = self.socket()?;

        if !self.mode.is_server() {
            return Ok(socket.send(buf).await?);
        }

        let peer = self.peer_addr();
        match peer {
            Some(peer) => Ok(socket.send_to(buf, peer).await?),
            None => {
                trace!("No UDP peer yet, dropping {} bytes", buf.len());
                Ok(0)
            }
        }
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}
