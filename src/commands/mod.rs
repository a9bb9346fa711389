//! Command dispatch
//!
//! The static registry of named desktop actions and the OS executor that
//! carries them out.

mod actions;
mod executor;
mod registry;

pub use actions::{DesktopAction, DesktopCommand};
pub use executor::{ActionExecutor, Invocation, ProcessExecutor};
pub use registry::{CommandAction, CommandRegistry, normalize_command_name};
