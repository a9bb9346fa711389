//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the HTTP server and recognition loops
//! - status, voice, visual: inspect and toggle the loops
//! - exec, history, commands: run and review desktop commands
//! - dashboard: terminal UI (also the default with no subcommand)

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Handsfree - desktop automation driven by voice and visual recognition
#[derive(Parser, Debug)]
#[command(name = "handsfree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Server URL for client subcommands (defaults to the configured host/port)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// On/off argument for the toggle subcommands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        matches!(self, Switch::On)
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server in the foreground
    Serve {
        /// Override the configured bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(short, long)]
        port: Option<u16>,

        /// Start these loops immediately
        #[arg(long)]
        voice: bool,

        #[arg(long)]
        visual: bool,
    },

    /// Show server health and loop state
    Status,

    /// Turn the voice loop on or off
    Voice {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Turn the visual loop on or off
    Visual {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Execute a command by name (e.g. `exec volume up`)
    Exec {
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Show recent command history
    History {
        /// Number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Keep polling and print new entries
        #[arg(short, long)]
        follow: bool,
    },

    /// List available commands
    Commands,

    /// Launch the terminal dashboard
    Dashboard,
}
