//! Runtime - Configuration-driven link construction
//!
//! The runtime is responsible for:
//! - Picking plugins from the registries by configured type
//! - Opening them with their raw options
//! - Driving the link until shutdown

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::common::{Error, Result};
use crate::config::{Config, LogConfig};
use crate::obfs::create_obfuscator;
use crate::transport::{create_transport, Mode};

use super::link::Link;

/// How long the client waits for an echo
const REPLY_TIMEOUT: Duration = Duration::from_secs(3);

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when it parses.
pub fn init_logging(log: &LogConfig) -> Result<()> {
    let level = match std::env::var("RUST_LOG").ok().and_then(|s| s.parse::<Level>().ok()) {
        Some(level) => level,
        None => log
            .level
            .parse::<Level>()
            .map_err(|_| Error::Config(format!("invalid log level: {}", log.level)))?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set tracing subscriber: {}", e)))
}

/// Open the configured transport and obfuscator and pair them
pub async fn build_link(config: &Config) -> Result<Link> {
    let mode = Mode::from(config.transport.server);

    let mut transport = create_transport(config.transport.kind);
    transport.open(mode, &config.transport.options).await?;

    let max_obfsed_len = config
        .obfs
        .max_obfsed_len
        .unwrap_or_else(|| transport.mtu().saturating_sub(config.overhead));

    let mut obfs = create_obfuscator(config.obfs.kind);
    if let Err(e) = obfs.open(&config.obfs.options, max_obfsed_len) {
        transport.close().await?;
        return Err(e);
    }

    debug!(
        "Built link: {} (mtu {}) + {} (capacity {})",
        transport.name(),
        transport.mtu(),
        obfs.name(),
        max_obfsed_len
    );
    Link::new(transport, obfs, config.overhead)
}

/// Runtime manages the link lifecycle
pub struct Runtime {
    link: Link,
    mode: Mode,
}

impl Runtime {
    /// Build runtime from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            link: build_link(config).await?,
            mode: Mode::from(config.transport.server),
        })
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    /// Run until Ctrl-C (or end of input for a client), then close the link
    pub async fn run(mut self) -> Result<()> {
        let result = tokio::select! {
            res = self.drive() => res,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                Ok(())
            }
        };

        self.link.close().await?;
        result
    }

    async fn drive(&self) -> Result<()> {
        match self.mode {
            Mode::Server => self.echo().await,
            Mode::Client => self.ping().await,
        }
    }

    /// Server: send every packet back to whoever sent it
    async fn echo(&self) -> Result<()> {
        info!("Echoing on {}", self.link.transport().local_addr()?);
        let mut buf = vec![0u8; self.link.transport().mtu()];

        loop {
            let n = match self.link.recv(&mut buf).await {
                Ok(n) => n,
                Err(Error::ConnectionClosed) => return Ok(()),
                Err(Error::Oversized { len, max }) => {
                    warn!("Dropping {} byte packet (max {})", len, max);
                    continue;
                }
                Err(e) => return Err(e),
            };
            debug!("Echoing {} bytes", n);

            let echoed = &buf[..n.min(self.link.max_plain_len())];
            self.link.send(echoed).await?;
        }
    }

    /// Client: send each stdin line and print the reply
    async fn ping(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buf = vec![0u8; self.link.transport().mtu()];

        while let Some(line) = lines.next_line().await? {
            match self.link.send(line.as_bytes()).await {
                Ok(_) => {}
                Err(Error::Oversized { len, max }) => {
                    warn!("Line too long ({} bytes, max {})", len, max);
                    continue;
                }
                Err(e) => return Err(e),
            }

            match tokio::time::timeout(REPLY_TIMEOUT, self.link.recv(&mut buf)).await {
                Ok(res) => {
                    let n = res?;
                    println!("{}", String::from_utf8_lossy(&buf[..n]));
                }
                Err(_) => warn!("No reply within {:?}", REPLY_TIMEOUT),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obfs::ObfsKind;
    use crate::transport::TransportKind;
    use serde_json::json;

    fn server_config() -> Config {
        Config::from_json(
            r#"{
                "transport": { "type": "udp", "server": true,
                               "options": { "server_addr": "127.0.0.1:0", "mtu": 1200 } },
                "obfs": { "type": "xor", "options": { "key": "runtime" } },
                "overhead": 40
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_link_derives_capacity() {
        let link = build_link(&server_config()).await.unwrap();
        assert_eq!(link.transport().mtu(), 1200);
        assert_eq!(link.max_plain_len(), 1160);
        assert_eq!(link.obfuscator().name(), "xor");
    }

    #[tokio::test]
    async fn test_build_link_explicit_capacity() {
        let mut config = server_config();
        config.obfs.max_obfsed_len = Some(500);
        let link = build_link(&config).await.unwrap();
        assert_eq!(link.max_plain_len(), 500);

        config.obfs.max_obfsed_len = Some(1190);
        assert!(matches!(build_link(&config).await, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_build_link_missing_key() {
        let mut config = server_config();
        config.obfs.options = json!({});
        let err = build_link(&config).await.err().unwrap();
        match err {
            Error::Config(msg) => assert!(msg.contains("key"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_build_link_plain_default() {
        let mut config = server_config();
        config.obfs = Default::default();
        let link = build_link(&config).await.unwrap();
        assert_eq!(link.obfuscator().name(), ObfsKind::Plain.to_string());
        assert_eq!(link.transport().name(), TransportKind::Udp.to_string());
    }

    #[tokio::test]
    async fn test_echo_round_trip() {
        let runtime = Runtime::from_config(&server_config()).await.unwrap();
        let server_addr = runtime.link().transport().local_addr().unwrap();
        let server = tokio::spawn(runtime.run());

        let mut client_config = server_config();
        client_config.transport.server = false;
        client_config.transport.options = json!({ "server_addr": server_addr.to_string(), "mtu": 1200 });
        let mut client = build_link(&client_config).await.unwrap();

        client.send(b"echo me").await.unwrap();
        let mut buf = [0u8; 1200];
        let n = tokio::time::timeout(Duration::from_secs(2), client.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"echo me");

        client.close().await.unwrap();
        server.abort();
    }

    #[test]
    fn test_init_logging_rejects_bad_level() {
        std::env::remove_var("RUST_LOG");
        let err = init_logging(&LogConfig {
            level: "loud".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
