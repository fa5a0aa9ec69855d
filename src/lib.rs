//! Koish - a line-oriented command shell
//!
//! A line is split into jobs on `;` and each job into pipelined tasks on `|`.
//! Jobs run one after another; the tasks of a job run concurrently as child
//! processes connected by pipes, or inside the shell for builtins.

#![recursion_limit = "1024"]
#![deny(missing_debug_implementations, unused_import_braces)]

#[macro_use]
extern crate error_chain;

#[macro_use]
mod util;

mod editor;
pub mod errors;
pub mod job;
pub mod parser;
pub mod shell;

pub use crate::editor::{Editor, LineReader, LineSource};
pub use crate::job::{Job, Status, Task};
pub use crate::parser::tokenize;
pub use crate::shell::builtins::{BuiltinCommand, Builtins};
pub use crate::shell::{Shell, ShellConfig};
pub use crate::util::{isatty, KoishExitStatusExt};
