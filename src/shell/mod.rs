//! External command execution and environment detection.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{CommandResult, CommandRunner, SystemRunner, ToolCommand};
pub use mock::{MockResponse, MockRunner};
pub use platform::is_ci;
