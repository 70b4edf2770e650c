//! Configuration module for tunwire
//!
//! Plugin options arrive as JSON and are decoded once, at the boundary, into
//! the typed record each plugin declares. A bad shape becomes a single
//! `Error::Config` naming the plugin and the offending field.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::obfs::ObfsKind;
use crate::transport::TransportKind;

/// Decode a plugin's raw options into its typed options record
pub fn decode_options<T: DeserializeOwned>(plugin: &str, options: &serde_json::Value) -> Result<T> {
    T::deserialize(options).map_err(|e| Error::Config(format!("{} options: {}", plugin, e)))
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log configuration
    #[serde(default)]
    pub log: LogConfig,

    /// Transport selection and options
    pub transport: TransportSection,

    /// Obfuscator selection and options
    #[serde(default)]
    pub obfs: ObfsSection,

    /// Bytes per packet reserved by the layer above the obfuscator
    #[serde(default)]
    pub overhead: usize,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Create a default server configuration
    pub fn default_server() -> Self {
        Config {
            log: LogConfig::default(),
            transport: TransportSection {
                kind: TransportKind::Udp,
                server: true,
                options: json!({ "server_addr": "0.0.0.0:4000" }),
            },
            obfs: ObfsSection {
                kind: ObfsKind::Xor,
                options: json!({ "key": "change-me" }),
                max_obfsed_len: None,
            },
            overhead: 0,
        }
    }

    /// Create a default client configuration
    pub fn default_client() -> Self {
        Config {
            log: LogConfig::default(),
            transport: TransportSection {
                kind: TransportKind::Udp,
                server: false,
                options: json!({ "server_addr": "vpn.example.com:4000", "mtu": 1450 }),
            },
            obfs: ObfsSection {
                kind: ObfsKind::Xor,
                options: json!({ "key": "change-me" }),
                max_obfsed_len: None,
            },
            overhead: 0,
        }
    }
}

/// Log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Transport section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSection {
    /// Transport type
    #[serde(rename = "type")]
    pub kind: TransportKind,

    /// Listen (true) or connect (false)
    #[serde(default)]
    pub server: bool,

    /// Transport-specific options, decoded by the transport on open
    #[serde(default)]
    pub options: serde_json::Value,
}

/// Obfuscator section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObfsSection {
    /// Obfuscator type
    #[serde(rename = "type", default)]
    pub kind: ObfsKind,

    /// Obfuscator-specific options, decoded by the obfuscator on open
    #[serde(default)]
    pub options: serde_json::Value,

    /// Plaintext capacity; defaults to transport MTU minus `overhead`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_obfsed_len: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
        #[serde(default)]
        port: u16,
    }

    #[test]
    fn test_decode_options() {
        let sample: Sample = decode_options("sample", &json!({ "name": "a" })).unwrap();
        assert_eq!(sample.name, "a");
        assert_eq!(sample.port, 0);
    }

    #[test]
    fn test_decode_options_names_plugin_and_field() {
        let err = decode_options::<Sample>("sample", &json!({ "port": 1 })).unwrap_err();
        match err {
            Error::Config(msg) => {
                assert!(msg.starts_with("sample options"), "{}", msg);
                assert!(msg.contains("name"), "{}", msg);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_json(
            r#"{
                "log": { "level": "debug" },
                "transport": {
                    "type": "udp",
                    "server": true,
                    "options": { "server_addr": "0.0.0.0:4000", "mtu": 1400 }
                },
                "obfs": { "type": "xor", "options": { "key": "secret" }, "max_obfsed_len": 1380 },
                "overhead": 20
            }"#,
        )
        .unwrap();

        assert_eq!(config.log.level, "debug");
        assert_eq!(config.transport.kind, TransportKind::Udp);
        assert!(config.transport.server);
        assert_eq!(config.transport.options["mtu"], 1400);
        assert_eq!(config.obfs.kind, ObfsKind::Xor);
        assert_eq!(config.obfs.max_obfsed_len, Some(1380));
        assert_eq!(config.overhead, 20);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_json(
            r#"{ "transport": { "type": "udp", "options": { "server_addr": "127.0.0.1:1" } } }"#,
        )
        .unwrap();

        assert_eq!(config.log.level, "info");
        assert!(!config.transport.server);
        assert_eq!(config.obfs.kind, ObfsKind::Plain);
        assert_eq!(config.obfs.max_obfsed_len, None);
        assert_eq!(config.overhead, 0);
    }

    #[test]
    fn test_unknown_transport_type() {
        let err = Config::from_json(r#"{ "transport": { "type": "carrier-pigeon" } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default_client();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.transport.server, config.transport.server);
        assert_eq!(parsed.transport.options, config.transport.options);
        assert_eq!(parsed.obfs.kind, ObfsKind::Xor);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/tunwire.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
