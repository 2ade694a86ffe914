//! Per-call key derivation.
//!
//! Every request and every response is encrypted under its own key:
//! `SHA-256(secret || "_" || nonce || "_" || timestamp)`. The shared secret
//! never leaves the client; the nonce and timestamp travel in the clear.

use std::fmt;

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Derived key size in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Random bytes behind a request nonce.
pub const NONCE_BYTES: usize = 16;

/// Separator between the derivation inputs.
const FIELD_SEPARATOR: &[u8] = b"_";

/// Pre-provisioned password shared with the server.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SharedSecret {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(<redacted>)")
    }
}

/// 256-bit key bound to one (secret, nonce, timestamp) triple.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    /// Wrap raw key bytes, e.g. a key computed by the server side in tests.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for DerivedKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for DerivedKey {}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive the symmetric key for one message.
///
/// Pure and infallible: empty secrets and nonces are accepted as-is.
pub fn derive_key(secret: &SharedSecret, nonce: &str, timestamp: i64) -> DerivedKey {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(nonce.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(timestamp.to_string().as_bytes());
    DerivedKey(hasher.finalize().into())
}

/// Generate a fresh request nonce: 128 random bits as lowercase hex.
pub fn generate_nonce() -> Result<String, CryptoError> {
    let mut bytes = [0u8; NONCE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;
    Ok(hex::encode(bytes))
}
