//! Plain obfuscator - copies payloads through unchanged

use crate::error::Result;

use super::Obfuscator;

/// Identity obfuscator, used when no concealment is configured
#[derive(Debug, Default)]
pub struct PlainObfuscator {
    max_len: usize,
}

impl PlainObfuscator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Obfuscator for PlainObfuscator {
    fn open(&mut self, _options: &serde_json::Value, max_obfsed_len: usize) -> Result<()> {
        self.max_len = max_obfsed_len;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn max_plain_len(&self) -> usize {
        self.max_len
    }

    fn encode(&self, src: &[u8], dst: &mut [u8]) -> usize {
        dst[..src.len()].copy_from_slice(src);
        src.len()
    }

    fn decode(&self, src: &[u8], dst: &mut [u8]) -> Result<usize> {
        Ok(self.encode(src, dst))
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_passthrough() {
        let mut plain = PlainObfuscator::new();
        plain.open(&serde_json::Value::Null, 512).unwrap();
        assert_eq!(plain.max_plain_len(), 512);

        let mut dst = [0u8; 16];
        let n = plain.encode(b"hello", &mut dst);
        assert_eq!(&dst[..n], b"hello");

        let mut back = [0u8; 16];
        let m = plain.decode(&dst[..n], &mut back).unwrap();
        assert_eq!(&back[..m], b"hello");
    }
}
