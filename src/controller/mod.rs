//! Loop controller
//!
//! Owns the voice and visual recognition loops, the command registry and the
//! shared history log:
//! - start/stop each loop independently (idempotent)
//! - dispatch recognized phrases through the registry
//! - record every outcome in history

mod loop_controller;
mod worker;

pub use loop_controller::{ControllerConfig, ControllerStatus, LoopController, ManualOutcome};
