//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use warptoggle_core::OutputFormat;

/// warptoggle - WARP on/off for your status bar
#[derive(Debug, Parser)]
#[command(name = "warptoggle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "WARPTOGGLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    // --- Output format flags ---
    /// Output in Waybar JSON format
    #[arg(long, group = "output_format")]
    pub waybar: bool,

    /// Output in JSON format
    #[arg(long, group = "output_format")]
    pub json: bool,

    // --- Connection flags ---
    /// Path to the daemon socket
    #[arg(long, env = "WARPTOGGLE_SOCKET")]
    pub socket_path: Option<PathBuf>,

    /// Connection timeout in seconds (default: from config, 5)
    #[arg(long)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Returns the output format based on CLI flags.
    pub fn output_format(&self) -> OutputFormat {
        if self.waybar {
            OutputFormat::Waybar
        } else if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Tty
        }
    }
}

/// Available commands. Without one, the current state is printed.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Flip the connection: connect when off, disconnect when on
    Toggle,

    /// Bring the tunnel up
    Connect,

    /// Tear the tunnel down
    Disconnect,

    /// Force an immediate status check in the daemon
    Check,

    /// Show daemon status
    Status,

    /// Check whether the daemon is alive
    Ping,

    /// Start the daemon in the foreground
    Server,
}
