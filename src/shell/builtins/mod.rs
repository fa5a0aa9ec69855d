//! Koish builtins
//!
//! Builtins run inside the shell process, reading and writing whatever is
//! bound to the standard streams when they are invoked. They are looked up by
//! exact name in registration order; the first match wins.

use std::fmt;
use std::io::Write;

use log::debug;

use self::dirs::Cd;
use self::exit::Exit;
use self::help::Help;
use self::prelude::*;

pub mod prelude {
    pub use std::io::Write;
    pub use std::process::ExitStatus;

    pub use super::{BuiltinCommand, Builtins};
    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::job::Status;
    pub use crate::util::KoishExitStatusExt;
}

mod dirs;
mod exit;
mod help;

/// Represents a Koish builtin command such as cd or help.
pub trait BuiltinCommand {
    /// The name the command is invoked by.
    fn name(&self) -> &'static str;
    /// One-line description shown by `help`.
    fn description(&self) -> &'static str;
    /// The help string to display to the user; the first line is the usage.
    fn help(&self) -> &'static str;
    /// The usage string to display to the user.
    fn usage(&self) -> &'static str {
        self.help().lines().next().unwrap_or_default()
    }
    /// Runs the command with its full argument vector (`argv[0]` is the name).
    ///
    /// `Status::Terminate` asks the shell to exit; everything else continues.
    fn run(&self, builtins: &Builtins, argv: &[String], stdout: &mut dyn Write) -> Result<Status>;
}

/// Ordered registry of builtin commands.
pub struct Builtins {
    commands: Vec<Box<dyn BuiltinCommand>>,
}

impl Builtins {
    /// An empty registry.
    pub fn new() -> Self {
        Builtins {
            commands: Vec::new(),
        }
    }

    pub fn register<B: BuiltinCommand + 'static>(&mut self, command: B) {
        self.commands.push(Box::new(command));
    }

    pub fn find(&self, name: &str) -> Option<&dyn BuiltinCommand> {
        self.commands
            .iter()
            .find(|c| c.name() == name)
            .map(|c| &**c)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn BuiltinCommand> {
        self.commands.iter().map(|c| &**c)
    }

    /// Runs the builtin named by `argv[0]`.
    ///
    /// Returns `None` when no builtin has that name, so the caller can fall back
    /// to an external program. Errors raised by the builtin are reported on
    /// stderr and turned into a continuing status.
    pub fn run(&self, argv: &[String], stdout: &mut dyn Write) -> Option<Status> {
        let command = self.find(argv.first()?)?;
        debug!("running builtin '{}'", argv.join(" "));
        let result = command.run(self, argv, stdout);
        if let Err(e) = stdout.flush() {
            debug!("failed to flush builtin output: {}", e);
        }
        Some(get_builtin_status(result))
    }
}

impl Default for Builtins {
    fn default() -> Self {
        let mut builtins = Builtins::new();
        builtins.register(Help);
        builtins.register(Exit);
        builtins.register(Cd);
        builtins
    }
}

impl fmt::Debug for Builtins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|c| c.name())).finish()
    }
}

fn get_builtin_status(result: Result<Status>) -> Status {
    match result {
        Ok(status) => status,
        Err(e) => {
            eprintln!("koish: {}", e);
            let code = match *e.kind() {
                ErrorKind::BuiltinCommand(_, code) => code,
                _ => 1,
            };
            Status::Continue(ExitStatus::from_status(code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    struct Shadow;

    impl BuiltinCommand for Shadow {
        fn name(&self) -> &'static str {
            "help"
        }

        fn description(&self) -> &'static str {
            "shadowed"
        }

        fn help(&self) -> &'static str {
            "help: help"
        }

        fn run(&self, _: &Builtins, argv: &[String], stdout: &mut dyn Write) -> Result<Status> {
            writeln!(stdout, "{}", argv[1..].join(" "))?;
            Ok(Status::success())
        }
    }

    #[test]
    fn default_registration_order() {
        let names: Vec<&str> = Builtins::default().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["help", "exit", "cd"]);
    }

    #[test]
    fn lookup_is_exact() {
        let builtins = Builtins::default();
        assert!(builtins.is_builtin("cd"));
        assert!(!builtins.is_builtin("CD"));
        assert!(!builtins.is_builtin("cd "));
        assert!(!builtins.is_builtin("ls"));
    }

    #[test]
    fn unknown_command_is_not_run() {
        let mut out = Vec::new();
        assert!(Builtins::default().run(&argv(&["ls"]), &mut out).is_none());
        assert!(Builtins::default().run(&[], &mut out).is_none());
        assert!(out.is_empty());
    }

    #[test]
    fn first_registered_name_wins() {
        let mut builtins = Builtins::new();
        builtins.register(Shadow);
        builtins.register(Help);
        let mut out = Vec::new();
        let status = builtins.run(&argv(&["help", "a", "b"]), &mut out);
        assert_eq!(status, Some(Status::success()));
        assert_eq!(String::from_utf8(out).unwrap(), "a b\n");
    }

    #[test]
    fn builtin_errors_continue_with_their_code() {
        let status = get_builtin_status(Err(Error::builtin_command("nope", 3)));
        assert_eq!(status, Status::Continue(ExitStatus::from_status(3)));

        let io_error = ::std::io::Error::new(::std::io::ErrorKind::Other, "io");
        let status = get_builtin_status(Err(io_error.into()));
        assert_eq!(status, Status::failure());
    }

    #[test]
    fn usage_is_first_help_line() {
        assert_eq!(Exit.usage(), "exit: exit [n]");
    }
}
