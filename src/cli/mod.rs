//! CLI module for handsfree - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for serving, toggling
//! loops, running commands, and launching the dashboard.

pub mod commands;

pub use commands::{Cli, Commands, Switch};
