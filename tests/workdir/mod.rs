#![allow(dead_code)]

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{self, Command, Stdio};

use tempfile::TempDir;

/// WorkDir represents a directory in which tests are run.
#[derive(Debug)]
pub struct WorkDir {
    /// Scratch directory the shell runs in; it also holds the shell's log.
    dir: TempDir,
}

impl WorkDir {
    /// Creates a fresh scratch directory.
    pub fn new() -> WorkDir {
        WorkDir {
            dir: TempDir::new().expect("unable to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Builds a new `koish` command running in this working directory.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(self.bin());
        cmd.current_dir(self.path());
        cmd.arg(format!("--log={}", self.path().join("koish.log").display()));
        cmd.args(args);
        cmd
    }

    /// Runs `koish -c <line>`.
    pub fn run_line(&self, line: &str) -> process::Output {
        self.command(&["-c", line])
            .output()
            .expect("failed to run koish")
    }

    /// Runs `koish` with `input` on its standard input.
    pub fn run_stdin(&self, input: &str) -> process::Output {
        let no_args: [&str; 0] = [];
        let mut child = self
            .command(&no_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn koish");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("failed to write input");
        child.wait_with_output().expect("failed to wait for koish")
    }

    /// Returns path to executable.
    fn bin(&self) -> PathBuf {
        PathBuf::from(env!("CARGO_BIN_EXE_koish"))
    }
}

pub fn stdout(output: &process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
