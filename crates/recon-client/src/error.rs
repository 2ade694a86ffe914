//! Error types for the Recon client.

use recon_crypto::CryptoError;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias using [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;

/// Everything that can go wrong during one command round trip.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration or unusable crypto backend, raised before any I/O.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection refused, DNS failure, timeout. Never retried here.
    #[error("Connection error: {0}")]
    Transport(#[from] TransportError),

    /// The server answered with an HTTP error status.
    #[error("{message}")]
    ServerRejected { status: u16, message: String },

    /// Body was not JSON, or a success response lacked required fields.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The outbound command could not be encrypted.
    #[error("Encryption error: {0}")]
    Encryption(#[source] CryptoError),

    /// The server's reply could not be decrypted.
    #[error("Failed to decrypt response: {0}")]
    Decryption(#[source] CryptoError),

    /// The server returned `success: false`; the message is passed through verbatim.
    #[error("{0}")]
    ProtocolFailure(String),

    /// Request serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status carried by a server rejection, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
