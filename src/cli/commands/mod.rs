//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait, which provides a uniform
//! interface for executing commands and reporting results.
//!
//! # Architecture
//!
//! Commands are dispatched via [`CommandDispatcher`], which routes CLI
//! subcommands to their implementations. This allows:
//! - Single binary with subcommands (`bundlekit bootstrap`, `bundlekit verify`)
//! - Shared settings resolution
//! - Consistent global flag handling

pub mod bootstrap;
pub mod completions;
pub mod dispatcher;
pub mod verify;

pub use bootstrap::BootstrapCommand;
pub use completions::CompletionsCommand;
pub use dispatcher::{Command, CommandDispatcher, CommandResult};
pub use verify::VerifyCommand;
