//! Link - one transport paired with one obfuscator
//!
//! Outbound: plaintext → Obfuscator (encode) → Transport (write)
//! Inbound:  Transport (read) → Obfuscator (decode) → plaintext
//!
//! The two plugins never see each other; the link owns both and enforces
//! the one number they must agree on: the obfuscator's plaintext capacity
//! fits in the transport's MTU after the caller's own overhead.

use tracing::trace;

use crate::common::{Error, Result};
use crate::obfs::Obfuscator;
use crate::transport::Transport;

pub struct Link {
    transport: Box<dyn Transport>,
    obfs: Box<dyn Obfuscator>,
}

impl Link {
    /// Pair an opened transport with an opened obfuscator.
    ///
    /// `overhead` is what the layer above reserves in every datagram.
    pub fn new(
        transport: Box<dyn Transport>,
        obfs: Box<dyn Obfuscator>,
        overhead: usize,
    ) -> Result<Self> {
        let budget = transport.mtu().saturating_sub(overhead);
        if obfs.max_plain_len() > budget {
            return Err(Error::Config(format!(
                "{} capacity {} exceeds {} MTU {} minus overhead {}",
                obfs.name(),
                obfs.max_plain_len(),
                transport.name(),
                transport.mtu(),
                overhead
            )));
        }

        Ok(Self { transport, obfs })
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn obfuscator(&self) -> &dyn Obfuscator {
        self.obfs.as_ref()
    }

    /// Largest plaintext accepted by [`Link::send`]
    pub fn max_plain_len(&self) -> usize {
        self.obfs.max_plain_len()
    }

    /// Obfuscate and send one packet.
    ///
    /// Returns what the transport reports, so `Ok(0)` still means a server
    /// that has not heard from any peer yet.
    pub async fn send(&self, plain: &[u8]) -> Result<usize> {
        let max = self.obfs.max_plain_len();
        if plain.len() > max {
            return Err(Error::Oversized {
                len: plain.len(),
                max,
            });
        }

        let mut wire = vec![0u8; self.transport.mtu().max(plain.len())];
        let n = self.obfs.encode(plain, &mut wire);
        trace!("[{}] encoded {} -> {} bytes", self.obfs.name(), plain.len(), n);
        self.transport.write(&wire[..n]).await
    }

    /// Receive and de-obfuscate one packet into `buf`
    pub async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        let mut wire = vec![0u8; self.transport.mtu()];
        let n = self.transport.read(&mut wire).await?;
        if n > buf.len() {
            return Err(Error::Oversized {
                len: n,
                max: buf.len(),
            });
        }
        self.obfs.decode(&wire[..n], buf)
    }

    /// Close the transport, then the obfuscator
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await?;
        self.obfs.close()
    }
}
