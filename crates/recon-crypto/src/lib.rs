//! Recon envelope library
//!
//! Cryptographic building blocks for the Recon remote command protocol.
//!
//! ## Crypto primitives
//!
//! - **Key derivation**: `SHA-256(secret_nonce_timestamp)`, one key per message
//! - **Envelope**: AES-256-CBC, random 16-byte IV, PKCS#7 padding, base64 framing
//! - **Nonces**: 128 bits from the OS random source, hex encoded

pub mod envelope;
pub mod error;
pub mod kdf;

pub use envelope::{
    BLOCK_SIZE, COMMAND_PREFIX, IV_SIZE, decrypt, encrypt, encrypt_command, self_test,
};
pub use error::CryptoError;
pub use kdf::{DerivedKey, KEY_SIZE, NONCE_BYTES, SharedSecret, derive_key, generate_nonce};
