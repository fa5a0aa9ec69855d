//! The Shell drives the read, tokenize, execute cycle. The jobs parsed from a
//! line live only until that line has been executed.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{self, ExitStatus};

use log::{debug, error, info, warn};

use super::builtins::Builtins;
use super::execute_command;
use super::{ShellConfig, HISTORY_FILE_NAME};
use crate::editor::{Editor, LineReader, LineSource};
use crate::errors::{ErrorKind, Result};
use crate::job::Status;
use crate::parser;
use crate::util::{self, KoishExitStatusExt};

const PROMPT: &str = "\n\x1b[1mᗜˬᗜ > \x1b[0m";

/// Koish Shell
pub struct Shell {
    builtins: Builtins,
    /// Responsible for readline and history; only set for interactive shells.
    editor: Option<Editor>,
    history_file: Option<PathBuf>,
    /// Exit status of last command executed.
    last_exit_status: ExitStatus,
    config: ShellConfig,
}

impl Shell {
    /// Constructs a new Shell with the default builtins.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        Shell::with_builtins(config, Builtins::default())
    }

    pub fn with_builtins(config: ShellConfig, builtins: Builtins) -> Result<Shell> {
        let mut shell = Shell {
            builtins,
            editor: None,
            history_file: None,
            last_exit_status: ExitStatus::from_success(),
            config,
        };

        if config.enable_command_history {
            shell.editor = Some(Editor::with_capacity(config.command_history_capacity)?);
            shell.load_history()?;
        }

        info!("koish started up");
        Ok(shell)
    }

    fn load_history(&mut self) -> Result<()> {
        self.history_file = dirs::home_dir().map(|p| p.join(HISTORY_FILE_NAME));
        match (self.editor.as_mut(), self.history_file.as_ref()) {
            (Some(editor), Some(history_file)) => editor.load_history(history_file)?,
            (_, None) => warn!("unable to get home directory"),
            _ => {}
        }

        Ok(())
    }

    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    pub fn last_exit_status(&self) -> ExitStatus {
        self.last_exit_status
    }

    /// Custom prompt to output to the user.
    pub fn prompt(&self) -> String {
        PROMPT.to_string()
    }

    /// Runs every job of one input line, in order.
    ///
    /// Stops early when a builtin requests termination. A job whose pipes
    /// could not be created is reported and counts as failed; a fork failure
    /// is returned to the caller.
    pub fn execute_command_string(&mut self, input: &str) -> Result<Status> {
        let mut jobs = parser::tokenize(input);
        debug!("'{}' parsed into {} job(s)", input, jobs.len());

        let mut status = Status::Continue(self.last_exit_status);
        for job in &mut jobs {
            status = match execute_command::execute_job(job, &self.builtins) {
                Ok(status) => status,
                Err(e) => {
                    if let ErrorKind::Pipe(_) = *e.kind() {
                        eprintln!("koish: {}", e);
                        Status::failure()
                    } else {
                        return Err(e);
                    }
                }
            };

            self.last_exit_status = status.exit_status();
            if status.is_terminal() {
                break;
            }
        }

        Ok(status)
    }

    /// Runs each line of the file at `path` until the end of the file or a
    /// termination request.
    pub fn execute_commands_from_file(&mut self, path: &Path) -> Result<Status> {
        let file = File::open(path)?;
        self.run(&mut LineReader::new(file))
    }

    /// Runs the lines of the shell's standard input, through the line editor
    /// if the shell is interactive.
    pub fn execute_from_stdin(&mut self) -> Result<Status> {
        match self.editor.take() {
            Some(mut editor) => {
                let result = self.run(&mut editor);
                self.editor = Some(editor);
                result
            }
            None => {
                let mut reader = LineReader::stdin()?;
                self.run(&mut reader)
            }
        }
    }

    /// Main loop: prompt, read a line, execute it; repeat until end of input
    /// or a termination request.
    pub fn run<S: LineSource + ?Sized>(&mut self, source: &mut S) -> Result<Status> {
        loop {
            let prompt = self.prompt();
            let line = match source.read_line(&prompt)? {
                Some(line) => line,
                None => break,
            };

            let status = self.execute_command_string(&line)?;
            if status.is_terminal() {
                info!("termination requested: {}", status);
                return Ok(status);
            }
        }

        debug!("end of input");
        Ok(Status::Continue(self.last_exit_status))
    }

    /// Exits the shell process with `n`, or with the last exit status.
    pub fn exit(&mut self, n: Option<ExitStatus>) -> ! {
        if self.config.display_messages {
            println!("exit");
        }

        let code = util::exit_code(n.unwrap_or(self.last_exit_status));

        if let (Some(editor), Some(history_file)) = (self.editor.as_mut(), self.history_file.as_ref())
        {
            if let Err(e) = editor.save_history(history_file) {
                error!(
                    "error: failed to save history to file during shutdown: {}",
                    e
                );
            }
        }

        let temp_result = io::stdout().flush();
        log_if_err!(temp_result, "failed to flush stdout on exit");
        info!("koish has shut down");
        process::exit(code);
    }
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("builtins", &self.builtins)
            .field("editor", &self.editor)
            .field("last_exit_status", &self.last_exit_status)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_input(input: &str) -> (Shell, Status) {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let status = shell.run(&mut LineReader::new(input.as_bytes())).unwrap();
        (shell, status)
    }

    #[test]
    fn end_of_input_continues_with_last_status() {
        let (shell, status) = run_input("");
        assert_eq!(status, Status::success());
        assert!(shell.last_exit_status().success());
    }

    #[test]
    fn exit_stops_reading_lines() {
        let (shell, status) = run_input("exit 3\nexit 4\n");
        assert!(status.is_terminal());
        assert_eq!(status.code(), 3);
        assert_eq!(shell.last_exit_status().code(), Some(3));
    }

    #[test]
    fn empty_lines_do_not_end_the_loop() {
        let (_, status) = run_input("\n   \n\t\nexit\n");
        assert_eq!(status, Status::Terminate(ExitStatus::from_success()));
    }

    #[test]
    fn cd_usage_error_continues() {
        let (shell, status) = run_input("cd\n");
        assert!(!status.is_terminal());
        assert_eq!(shell.last_exit_status().code(), Some(1));
    }

    #[test]
    fn exit_ends_the_job_sequence() {
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let status = shell.execute_command_string("cd ; exit 9 ; exit 2").unwrap();
        assert!(status.is_terminal());
        assert_eq!(status.code(), 9);
    }

    #[test]
    fn prompt_ends_with_marker() {
        let shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert!(shell.prompt().contains("ᗜˬᗜ > "));
    }
}
