//! Recon CLI Library
//!
//! Argument parsing and subcommands for the `recon` binary.

pub mod args;
pub mod command_cmd;
