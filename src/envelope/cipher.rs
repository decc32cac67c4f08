//! Run key and the repeating-key XOR transform.

use rand::RngCore;
use std::fmt;

use crate::core::{ObfuscatorError, ObfuscatorResult};

/// Key shared by every envelope of a run.
///
/// Stored and embedded as lowercase hex; the XOR runs against the bytes of
/// that hex text, so the embedded string literal is the whole key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionKey {
    hex: String,
}

impl EncryptionKey {
    /// `byte_len` random bytes from the thread RNG, hex encoded
    pub fn generate(byte_len: usize) -> Self {
        let mut bytes = vec![0u8; byte_len];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hex = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        Self { hex }
    }

    /// Key text as found in an envelope
    pub fn from_hex(hex: impl Into<String>) -> ObfuscatorResult<Self> {
        let hex = hex.into();
        if hex.is_empty() {
            return Err(ObfuscatorError::Envelope("empty key".to_string()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ObfuscatorError::Envelope(format!(
                "key is not hexadecimal: {}",
                hex
            )));
        }
        Ok(Self { hex })
    }

    pub fn as_str(&self) -> &str {
        &self.hex
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.hex.as_bytes()
    }
}

impl fmt::Display for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// `out[i] = data[i] ^ key[i % key.len()]`. Applying it twice with the same
/// key yields the input. An empty key leaves the data unchanged.
pub fn xor_cipher(data: &[u8], key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}
