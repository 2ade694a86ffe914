//! JSON wire types for the Recon HTTP API.
//!
//! Field names are fixed by the server and must not change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Body of the `POST /` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandRequest {
    pub user: String,
    pub nonce: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// Queue the command if the target player is offline.
    pub queue: bool,
    /// Encrypted, `RCON_`-tagged command blob.
    pub command: String,
}

/// Body returned by the server, success or failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse {
    pub success: bool,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Encrypted command output.
    #[serde(default)]
    pub response: Option<String>,
    /// Encrypted output with formatting codes stripped; newer servers only.
    #[serde(default)]
    pub plain_response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Lenient view of an HTTP error body; only `error` matters.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

/// Decrypted output of a successful command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub response: String,
    /// Same as `response` when the server sent no `plainResponse`.
    pub plain_response: String,
}

/// Flat success/failure summary, for callers that do not match on errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub success: bool,
    pub response: Option<String>,
    pub plain_response: Option<String>,
    pub error: Option<String>,
}

impl From<Result<CommandOutput, ClientError>> for CommandResponse {
    fn from(result: Result<CommandOutput, ClientError>) -> Self {
        match result {
            Ok(output) => Self {
                success: true,
                response: Some(output.response),
                plain_response: Some(output.plain_response),
                error: None,
            },
            Err(e) => Self {
                success: false,
                response: None,
                plain_response: None,
                error: Some(e.to_string()),
            },
        }
    }
}

impl fmt::Display for CommandResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "Success: {}", self.response.as_deref().unwrap_or_default())
        } else {
            write!(f, "Error: {}", self.error.as_deref().unwrap_or_default())
        }
    }
}
