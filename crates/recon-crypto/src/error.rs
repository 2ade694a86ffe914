//! Crypto error types.

/// Errors from envelope and key operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Malformed cipher blob: {0}")]
    MalformedBlob(String),

    #[error("Invalid padding")]
    InvalidPadding,

    #[error("Decrypted payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Secure random source unavailable: {0}")]
    RandomSource(String),

    #[error("Cipher self-test failed: {0}")]
    SelfTestFailed(String),
}
