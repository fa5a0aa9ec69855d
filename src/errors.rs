//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

use nix::errno::Errno;

error_chain! {
    foreign_links {
        Docopt(::docopt::Error);
        Io(::std::io::Error);
        Nix(::nix::Error);
        Readline(::rustyline::error::ReadlineError);
    }

    errors {
        /// A builtin command failed; `code` becomes the task's exit status.
        BuiltinCommand(message: String, code: i32) {
            description("builtin command error")
            display("{}", message)
        }

        /// Allocating the pipes for a job failed. Aborts the job only.
        Pipe(errno: Errno) {
            description("pipe creation failed")
            display("pipe: {}", errno)
        }

        /// Forking a task failed. The shell cannot continue safely.
        Fork(errno: Errno) {
            description("fork failed")
            display("fork: {}", errno)
        }

        /// An argument cannot be handed to exec.
        InvalidArgument(arg: String) {
            description("invalid argument")
            display("{}: argument contains a nul byte", arg)
        }
    }
}

impl Error {
    pub(crate) fn builtin_command<T: AsRef<str>>(message: T, code: i32) -> Error {
        ErrorKind::BuiltinCommand(message.as_ref().to_string(), code).into()
    }

    /// Is the error fatal to the whole shell process?
    pub fn is_fatal(&self) -> bool {
        matches!(*self.kind(), ErrorKind::Fork(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_command_displays_message() {
        let e = Error::builtin_command("expected a path for 'cd'!", 1);
        assert_eq!(e.to_string(), "expected a path for 'cd'!");
        match *e.kind() {
            ErrorKind::BuiltinCommand(_, code) => assert_eq!(code, 1),
            _ => panic!("unexpected kind"),
        }
    }

    #[test]
    fn only_fork_failures_are_fatal() {
        assert!(Error::from(ErrorKind::Fork(Errno::EAGAIN)).is_fatal());
        assert!(!Error::from(ErrorKind::Pipe(Errno::EMFILE)).is_fatal());
        assert!(!Error::builtin_command("x", 1).is_fatal());
    }

    #[test]
    fn pipe_error_names_the_errno() {
        let e = Error::from(ErrorKind::Pipe(Errno::EMFILE));
        assert!(e.to_string().starts_with("pipe: "));
    }
}
