//! Command-line arguments.
//!
//! Connection flags are the last layer of configuration: they override the
//! config file and `RECON_*` environment variables.

use std::path::PathBuf;

use clap::Parser;
use recon_client::ClientConfig;

use crate::command_cmd::CommandAction;

#[derive(Parser, Debug)]
#[command(name = "recon")]
#[command(version, about = "Send encrypted commands to a Recon server", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Config file (default: ~/.recon/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub action: CommandAction,
}

/// Per-invocation connection overrides.
#[derive(clap::Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Server hostname or IP address
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Username
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Shared password
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Use HTTPS
    #[arg(long, global = true, conflicts_with = "no_tls")]
    pub tls: bool,

    /// Use plain HTTP even if the config file or `RECON_TLS` enables HTTPS
    #[arg(long, global = true)]
    pub no_tls: bool,
}

impl ConnectionArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user.clone_from(user);
        }
        if let Some(password) = &self.password {
            config.password.clone_from(password);
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.tls {
            config.use_ssl = true;
        } else if self.no_tls {
            config.use_ssl = false;
        }
    }
}
