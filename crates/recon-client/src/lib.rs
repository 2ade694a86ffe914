//! Recon Client Library
//!
//! Sends commands to a Recon server over its encrypted HTTP API:
//! - Per-call key derivation and AES-256-CBC envelopes (via `recon-crypto`)
//! - JSON wire types and the request/response lifecycle
//! - reqwest transport behind a swappable trait
//! - Configuration resolution and tracing setup

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod tracing_init;
pub mod transport;

pub use client::{ReconClient, TEST_COMMAND};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use protocol::{CommandOutput, CommandRequest, CommandResponse, ServerResponse};
pub use transport::{Endpoint, HttpTransport, Transport, TransportError};
