//! Koish - Shell Module
//!
//! The shell reads lines, splits them into jobs and runs each job through the
//! pipeline executor.

pub use self::shell::Shell;

pub mod builtins;
pub mod execute_command;
#[allow(clippy::module_inception)]
mod shell;

const HISTORY_FILE_NAME: &str = ".koish_history";
const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;
const COMMAND_NOT_EXECUTABLE_EXIT_STATUS: i32 = 126;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Determines if input is read through the line editor and saved to the
    /// shell's command history.
    ///
    /// Note: This is checked before the other command history config fields.
    enable_command_history: bool,

    /// Number of entries to store in the shell's command history
    command_history_capacity: usize,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. line editing, command history
    ///
    /// # Complete List
    /// - Command History is enabled
    /// - The prompt is displayed
    /// - Some additional messages are displayed
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            enable_command_history: true,
            command_history_capacity,
            display_messages: true,
        }
    }

    /// Creates a noninteractive shell, e.g. no command history, no prompt
    ///
    /// # Complete List
    /// - Command History is disabled. Lines are read unbuffered from the input.
    /// - The prompt is not displayed.
    /// - Fewer messages are displayed
    pub fn noninteractive() -> Self {
        Default::default()
    }

    pub fn is_interactive(&self) -> bool {
        self.enable_command_history
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            enable_command_history: false,
            command_history_capacity: 0,
            display_messages: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noninteractive_is_default() {
        assert_eq!(ShellConfig::noninteractive(), ShellConfig::default());
        assert!(!ShellConfig::noninteractive().is_interactive());
    }

    #[test]
    fn interactive_keeps_capacity() {
        let config = ShellConfig::interactive(10);
        assert!(config.is_interactive());
        assert_eq!(config.command_history_capacity, 10);
        assert!(config.display_messages);
    }
}
