use std::io::{self, IsTerminal};

/// Is the shell's standard input attached to a terminal?
pub fn isatty() -> bool {
    io::stdin().is_terminal()
}
