use crate::error::Result;
use rand::RngCore;
use rand::rngs::OsRng;
use std::fmt;

/// Length of keys produced by [`SecretKey::generate`]
pub const GENERATED_KEY_LEN: usize = 32;

/// Server-side HMAC key. Never leaves the process.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a random key from the OS random source
    pub fn generate() -> Result<Self> {
        let mut bytes = vec![0u8; GENERATED_KEY_LEN];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl From<&str> for SecretKey {
    fn from(key: &str) -> Self {
        Self::new(key.as_bytes())
    }
}

impl From<String> for SecretKey {
    fn from(key: String) -> Self {
        Self::new(key.into_bytes())
    }
}

impl From<&[u8]> for SecretKey {
    fn from(key: &[u8]) -> Self {
        Self::new(key)
    }
}

impl<const N: usize> From<&[u8; N]> for SecretKey {
    fn from(key: &[u8; N]) -> Self {
        Self::new(key.as_slice())
    }
}

impl From<Vec<u8>> for SecretKey {
    fn from(key: Vec<u8>) -> Self {
        Self::new(key)
    }
}
