//! Repeating-key XOR obfuscator
//!
//! Byte `i` of a packet is XORed with `key[i % key.len()]`. The keystream
//! restarts at every packet, so output depends only on the input byte and its
//! position modulo the key length. This defeats naive payload fingerprinting
//! and nothing more: a short key falls to frequency analysis.

use serde::Deserialize;

use crate::config::decode_options;
use crate::error::{Error, Result};

use super::Obfuscator;

/// Options accepted by [`XorObfuscator::open`]
#[derive(Debug, Clone, Deserialize)]
pub struct XorOptions {
    /// Shared secret, used as raw bytes
    pub key: String,
}

/// XOR obfuscator
#[derive(Debug, Default)]
pub struct XorObfuscator {
    key: Vec<u8>,
    max_len: usize,
}

impl XorObfuscator {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, src: &[u8], dst: &mut [u8]) -> usize {
        assert!(!self.key.is_empty(), "xor obfuscator used before open");
        assert!(
            dst.len() >= src.len(),
            "destination too short: {} < {}",
            dst.len(),
            src.len()
        );

        for (i, (out, byte)) in dst.iter_mut().zip(src).enumerate() {
            *out = byte ^ self.key[i % self.key.len()];
        }
        src.len()
    }
}

impl Obfuscator for XorObfuscator {
    fn open(&mut self, options: &serde_json::Value, max_obfsed_len: usize) -> Result<()> {
        let opts: XorOptions = decode_options("xor obfuscator", options)?;
        if opts.key.is_empty() {
            return Err(Error::Config("xor obfuscator: `key` must not be empty".into()));
        }

        self.key = opts.key.into_bytes();
        self.max_len = max_obfsed_len;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn max_plain_len(&self) -> usize {
        self.max_len
    }

    /// # Panics
    ///
    /// Panics if the obfuscator was never opened or `dst` is shorter than `src`.
    fn encode(&self, src: &[u8], dst: &mut [u8]) -> usize {
        self.apply(src, dst)
    }

    /// XOR is its own inverse, so this never fails.
    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        Ok(self.apply(src, dst))
    }

    fn name(&self) -> &'static str {
        "xor"
    }
}
