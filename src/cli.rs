//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "leadrelay",
    version,
    about = "Lead capture endpoint that relays form submissions to Telegram"
)]
pub struct Cli {
    /// Path to a TOML config file (default: ./leadrelay.toml if present)
    #[arg(short, long, env = "LEADRELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides server.bind
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on, overrides server.port
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print the resolved configuration with secrets masked
    CheckConfig,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
