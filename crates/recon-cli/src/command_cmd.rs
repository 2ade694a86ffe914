//! Command subcommands: send, test.
//!
//! User-facing output uses writeln! to stdout (this is a CLI binary, not debug output).

use std::io::Write;

use recon_client::{ReconClient, Transport};

/// Command subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum CommandAction {
    /// Send a command to the server (without the leading slash).
    ///
    /// Flags may appear before or after the command words. Put words that
    /// start with `-` after `--`: `recon send -- say -hello`.
    Send {
        /// Command words, joined with spaces.
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
        /// Fail instead of queueing when the target player is offline.
        #[arg(long)]
        no_queue: bool,
        /// Print the response with formatting codes stripped.
        #[arg(long)]
        plain: bool,
    },
    /// Check that the server is reachable and the credentials work.
    Test,
}

/// Execute a command subcommand, writing results to `out`.
pub async fn run<T: Transport>(
    action: CommandAction,
    client: &ReconClient<T>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        CommandAction::Send {
            command,
            no_queue,
            plain,
        } => {
            let command = command.join(" ");
            let output = client.send_command(&command, !no_queue).await?;
            let text = if plain {
                output.plain_response
            } else {
                output.response
            };
            writeln!(out, "{text}")?;
        }
        CommandAction::Test => {
            let output = client.test_connection().await?;
            writeln!(out, "Connection successful!")?;
            if !output.response.is_empty() {
                writeln!(out, "Response: {}", output.response)?;
            }
        }
    }
    Ok(())
}
