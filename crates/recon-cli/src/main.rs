//! Recon CLI
//!
//! Sends one command to a Recon server and prints the decrypted response.

use std::io;

use clap::Parser;
use tracing::info;

use recon_cli::args::Cli;
use recon_cli::command_cmd;
use recon_client::tracing_init::init_tracing;
use recon_client::{ClientConfig, ReconClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing("recon=warn", cli.log_json);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting recon CLI");

    let mut config = ClientConfig::load(cli.config.as_deref())?;
    cli.connection.apply(&mut config);

    let client = ReconClient::new(&config)?;
    info!(url = %client.endpoint().url(), user = %config.user, "Client ready");

    let mut out = io::stdout();
    command_cmd::run(cli.action, &client, &mut out).await
}
