//! Handsfree - desktop automation driven by voice and visual recognition
//!
//! A LoopController runs two independently toggleable recognition loops,
//! dispatches recognized phrases through a fixed command registry, and keeps
//! a bounded history of every outcome. The HTTP server exposes it; the client
//! and dashboard drive it remotely.

pub mod cli;
pub mod client;
pub mod clock;
pub mod commands;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod recognition;
pub mod server;

pub use error::{HandsfreeError, Result};
