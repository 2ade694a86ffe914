//! Recon protocol client.
//!
//! One call = prepare (nonce, timestamp, key, encrypt) -> transmit -> parse
//! -> resolve (decrypt under the key derived from the *response's* nonce and
//! timestamp). Nothing is shared between calls except read-only settings.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use recon_crypto::{SharedSecret, derive_key, envelope, generate_nonce};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::protocol::{CommandOutput, CommandRequest, ErrorBody, ServerResponse};
use crate::transport::{Endpoint, HttpTransport, Transport, TransportError};

/// Command sent by [`ReconClient::test_connection`].
pub const TEST_COMMAND: &str = "recon test";

/// Client for one Recon server.
///
/// Holds only static settings, so `&self` calls may run concurrently.
pub struct ReconClient<T = HttpTransport> {
    endpoint: Endpoint,
    user: String,
    secret: SharedSecret,
    timeout: Duration,
    transport: T,
}

impl ReconClient<HttpTransport> {
    /// Build a client with the default reqwest transport.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {e}")))?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ReconClient<T> {
    /// Build a client over any transport.
    ///
    /// Validates the config and runs the cipher self-test, so a broken crypto
    /// backend surfaces here instead of on the first call.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        recon_crypto::self_test().map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint(),
            user: config.user.clone(),
            secret: SharedSecret::from(config.password.as_str()),
            timeout: config.timeout(),
            transport,
        })
    }

    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one command and return the decrypted output.
    ///
    /// `queue` asks the server to hold the command if its target is offline.
    pub async fn send_command(&self, command: &str, queue: bool) -> Result<CommandOutput> {
        let request = self.prepare(command, queue, unix_timestamp())?;
        debug!(
            nonce = %request.nonce,
            timestamp = request.timestamp,
            queue,
            url = %self.endpoint.url(),
            "Sending command"
        );
        let body = serde_json::to_vec(&request)?;

        let response = match self.transport.post(&self.endpoint, body, self.timeout).await {
            Ok(bytes) => bytes,
            Err(TransportError::Status { status, body }) => {
                let err = rejected(status, &body);
                warn!(status, error = %err, "Server rejected request");
                return Err(err);
            }
            Err(e) => {
                warn!(error = %e, "Transport failure");
                return Err(ClientError::Transport(e));
            }
        };

        self.resolve(&response)
    }

    /// Send [`TEST_COMMAND`] to check credentials and reachability.
    pub async fn test_connection(&self) -> Result<CommandOutput> {
        self.send_command(TEST_COMMAND, true).await
    }

    fn prepare(&self, command: &str, queue: bool, timestamp: i64) -> Result<CommandRequest> {
        let nonce = generate_nonce().map_err(ClientError::Encryption)?;
        let key = derive_key(&self.secret, &nonce, timestamp);
        let blob = envelope::encrypt_command(command, &key).map_err(ClientError::Encryption)?;

        Ok(CommandRequest {
            user: self.user.clone(),
            nonce,
            timestamp,
            queue,
            command: blob,
        })
    }

    /// Turn a response body into output or an error.
    ///
    /// A `success:false` body is a `ProtocolFailure` carrying `error` (or
    /// "Unknown error"). Any encrypted `response` it also carries, as servers
    /// send for commands that ran but failed, is not decrypted.
    fn resolve(&self, body: &[u8]) -> Result<CommandOutput> {
        let response: ServerResponse = serde_json::from_slice(body)
            .map_err(|e| ClientError::MalformedResponse(format!("invalid JSON: {e}")))?;

        if !response.success {
            let message = response.error.unwrap_or_else(|| "Unknown error".to_string());
            warn!(error = %message, "Server reported failure");
            return Err(ClientError::ProtocolFailure(message));
        }

        let (Some(nonce), Some(timestamp), Some(blob)) =
            (response.nonce, response.timestamp, response.response)
        else {
            return Err(ClientError::MalformedResponse(
                "success response is missing nonce, timestamp or response".into(),
            ));
        };

        // The server may answer with fresh freshness values.
        let key = derive_key(&self.secret, &nonce, timestamp);
        let text = envelope::decrypt(&blob, &key).map_err(ClientError::Decryption)?;
        let plain = match response.plain_response {
            Some(plain_blob) => {
                envelope::decrypt(&plain_blob, &key).map_err(ClientError::Decryption)?
            }
            None => text.clone(),
        };
        debug!(nonce = %nonce, timestamp, "Decrypted response");

        Ok(CommandOutput {
            response: text,
            plain_response: plain,
        })
    }
}

impl<T> std::fmt::Debug for ReconClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconClient")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Map an HTTP error status to `ServerRejected`, preferring the server's message.
fn rejected(status: u16, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP {status}"));
    ClientError::ServerRejected { status, message }
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
#[path = "client_tests.rs"]
mod tests;
