//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

/// Authoritative Dots-and-Boxes server over WebSockets.
#[derive(Parser, Debug)]
#[command(name = "dotgrid_server")]
#[command(about = "Real-time multiplayer Dots-and-Boxes server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to (overrides config and HOST).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides config and PORT).
    #[arg(short, long)]
    pub port: Option<u16>,
}
