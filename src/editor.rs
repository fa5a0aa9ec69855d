//! Line acquisition.
//!
//! The shell reads one line at a time through a [`LineSource`]: the
//! rustyline-backed [`Editor`] when a user is at a terminal, or a plain
//! [`LineReader`] for scripts and piped input.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::AsFd;
use std::path::Path;

use log::debug;
use rustyline::{
    self,
    completion::{Completer, FilenameCompleter, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::{DefaultHistory, History},
    validate::Validator,
    CompletionType, Config, Helper,
};

use crate::errors::Result;

/// Supplies input lines to the shell.
pub trait LineSource {
    /// Reads one line without its terminator, displaying `prompt` if the source
    /// is interactive. Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

struct EditorHelper(FilenameCompleter);

impl Completer for EditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.0.complete(line, pos, ctx)
    }
}

impl Hinter for EditorHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for EditorHelper {}

impl Helper for EditorHelper {}

impl Validator for EditorHelper {}

/// Interactive line editor with filename completion and history.
pub struct Editor {
    internal: rustyline::Editor<EditorHelper, DefaultHistory>,
    history_capacity: usize,
}

impl Editor {
    pub fn with_capacity(history_capacity: usize) -> Result<Editor> {
        let config = Config::builder()
            .max_history_size(history_capacity)?
            .history_ignore_space(true)
            .completion_type(CompletionType::Circular)
            .build();

        let mut internal = rustyline::Editor::with_config(config)?;
        internal.set_helper(Some(EditorHelper(FilenameCompleter::new())));

        Ok(Editor {
            internal,
            history_capacity,
        })
    }

    pub fn load_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        match self.internal.load_history(path) {
            Ok(()) => Ok(()),
            Err(ReadlineError::Io(ref inner)) if inner.kind() == io::ErrorKind::NotFound => {
                debug!("no history file at {}", path.as_ref().display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_history<P: AsRef<Path> + ?Sized>(&mut self, path: &P) -> Result<()> {
        self.internal.save_history(path)?;
        Ok(())
    }

    pub fn add_history_entry(&mut self, line: &str) -> Result<()> {
        self.internal.add_history_entry(line)?;
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.internal.history().len()
    }
}

impl LineSource for Editor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.internal.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.add_history_entry(&line)?;
                    }
                    return Ok(Some(line));
                }
                Err(ReadlineError::Eof) => return Ok(None),
                // Ctrl-C abandons the line being edited
                Err(ReadlineError::Interrupted) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "count: {}", self.history_len())?;
        write!(f, "capacity: {}", self.history_capacity)
    }
}

/// Reads lines from any byte stream, one byte at a time.
///
/// Reading unbuffered leaves everything after the current line in the
/// stream, so child processes that share the shell's stdin see it.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
}

impl<R: Read> LineReader<R> {
    pub fn new(reader: R) -> Self {
        LineReader { reader }
    }
}

impl LineReader<File> {
    /// A reader over a duplicate of the shell's standard input.
    pub fn stdin() -> Result<Self> {
        let fd = io::stdin().as_fd().try_clone_to_owned()?;
        Ok(LineReader::new(File::from(fd)))
    }
}

impl<R: Read> LineSource for LineReader<R> {
    /// Non-interactive sources never display the prompt.
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => {
                    return Ok(Some(String::from_utf8_lossy(&line).into_owned()))
                }
                Ok(_) => line.push(byte[0]),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if line.is_empty() {
            Ok(None)
        } else {
            Ok(Some(String::from_utf8_lossy(&line).into_owned()))
        }
    }
}
