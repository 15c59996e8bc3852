//! External command execution.

pub mod command;
pub mod mock;
pub mod platform;

pub use command::{
    Captured, CommandRunner, OutputCallback, OutputLine, SystemRunner, SPAWN_FAILURE_EXIT_CODE,
    TIMEOUT_EXIT_CODE,
};
pub use mock::ScriptedRunner;
pub use platform::{is_elevated, parse_system_path, resolve_tool_path, tool_available};
