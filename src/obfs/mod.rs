//! Obfuscation Layer
//!
//! Responsibilities:
//! - Reversible per-packet byte transforms that hide protocol fingerprints
//! - NO confidentiality, NO authentication, NO IO
//!
//! Every variant shares the same lifecycle: constructed empty, `open`ed once
//! with its options and a capacity bound, used through `encode`/`decode`,
//! then `close`d.

mod plain;
mod xor;

pub use plain::PlainObfuscator;
pub use xor::XorObfuscator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Obfuscator trait for payload transforms
///
/// `encode`/`decode` only read session state, so one opened obfuscator can
/// be shared by many callers as long as each uses its own buffers.
pub trait Obfuscator: Send + Sync {
    /// Validate options and record the plaintext capacity
    fn open(&mut self, options: &serde_json::Value, max_obfsed_len: usize) -> Result<()>;

    /// Release session state (always succeeds)
    fn close(&mut self) -> Result<()>;

    /// Largest plaintext guaranteed to encode without truncation
    fn max_plain_len(&self) -> usize;

    /// Transform `src` into `dst`, returning the number of bytes written
    fn encode(&self, src: &[u8], dst: &mut [u8]) -> usize;

    /// Reverse `encode`
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize>;

    /// Registry name of this variant
    fn name(&self) -> &'static str;
}

/// Obfuscator variants selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObfsKind {
    /// Identity transform
    #[default]
    #[serde(alias = "none")]
    Plain,
    /// Repeating-key XOR
    Xor,
}

impl FromStr for ObfsKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plain" | "none" => Ok(ObfsKind::Plain),
            "xor" => Ok(ObfsKind::Xor),
            other => Err(Error::Config(format!("unknown obfuscator type: {}", other))),
        }
    }
}

impl fmt::Display for ObfsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObfsKind::Plain => f.write_str("plain"),
            ObfsKind::Xor => f.write_str("xor"),
        }
    }
}

/// Create an unopened obfuscator of the given kind
pub fn create_obfuscator(kind: ObfsKind) -> Box<dyn Obfuscator> {
    match kind {
        ObfsKind::Plain => Box::new(PlainObfuscator::new()),
        ObfsKind::Xor => Box::new(XorObfuscator::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("xor".parse::<ObfsKind>().unwrap(), ObfsKind::Xor);
        assert_eq!("XOR".parse::<ObfsKind>().unwrap(), ObfsKind::Xor);
        assert_eq!("none".parse::<ObfsKind>().unwrap(), ObfsKind::Plain);
        assert!(matches!("rot13".parse::<ObfsKind>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_kind_serde() {
        let kind: ObfsKind = serde_json::from_value(json!("xor")).unwrap();
        assert_eq!(kind, ObfsKind::Xor);
        let kind: ObfsKind = serde_json::from_value(json!("none")).unwrap();
        assert_eq!(kind, ObfsKind::Plain);
        assert_eq!(serde_json::to_value(ObfsKind::Xor).unwrap(), json!("xor"));
    }

    #[test]
    fn test_registry_builds_each_kind() {
        for kind in [ObfsKind::Plain, ObfsKind::Xor] {
            let obfs = create_obfuscator(kind);
            assert_eq!(obfs.name(), kind.to_string());
            assert_eq!(obfs.max_plain_len(), 0);
        }
    }

    #[test]
    fn test_registry_obfuscator_lifecycle() {
        let mut obfs = create_obfuscator(ObfsKind::Xor);
        obfs.open(&json!({"key": "k3y"}), 1400).unwrap();

        let plain = b"through the trait object";
        let mut wire = [0u8; 64];
        let n = obfs.encode(plain, &mut wire);
        let mut back = [0u8; 64];
        let m = obfs.decode(&wire[..n], &mut back).unwrap();
        assert_eq!(&back[..m], plain);

        obfs.close().unwrap();
    }
}
