//! Client configuration.
//!
//! Resolution order (lowest to highest priority):
//! 1. Built-in defaults
//! 2. Config file (`~/.recon/config.json`, or an explicit path)
//! 3. Environment variables (`RECON_HOST`, `RECON_PORT`, ...)
//! 4. CLI arguments, applied by the binary

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};
use crate::transport::Endpoint;

/// Default Recon HTTP port.
pub const DEFAULT_PORT: u16 = 4161;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for one Recon server.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Shared secret; never sent over the wire.
    pub password: String,
    pub timeout_secs: u64,
    pub use_ssl: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            use_ssl: false,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("use_ssl", &self.use_ssl)
            .finish()
    }
}

impl ClientConfig {
    /// Path to the config file: `~/.recon/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".recon").join("config.json"))
    }

    /// Load with full resolution: defaults, file, then environment.
    ///
    /// `path` overrides the default file location. A missing default file is
    /// not an error; a missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => match Self::config_path() {
                Some(p) if p.exists() => Self::load_from(&p)?,
                _ => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read one JSON config file. Missing keys take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ClientError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("RECON_HOST") {
            self.host = val;
        }
        if let Some(val) = lookup("RECON_PORT") {
            if let Ok(n) = val.parse() {
                self.port = n;
            }
        }
        if let Some(val) = lookup("RECON_USER") {
            self.user = val;
        }
        if let Some(val) = lookup("RECON_PASSWORD") {
            self.password = val;
        }
        if let Some(val) = lookup("RECON_TIMEOUT") {
            if let Ok(n) = val.parse() {
                self.timeout_secs = n;
            }
        }
        if let Some(val) = lookup("RECON_TLS") {
            self.use_ssl = matches!(val.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Reject values that can never produce a working client.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ClientError::Config("host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ClientError::Config("port must not be 0".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config("timeout must be at least 1 second".into()));
        }
        if self.password.is_empty() {
            return Err(ClientError::Config("password must not be empty".into()));
        }
        Ok(())
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
            use_tls: self.use_ssl,
        }
    }
}
