//! Output formatting for rayskull commands.
//!
//! Results go to stdout. Everything else goes to stderr, and the [`Printer`]
//! decides whether to show it based on `--quiet` and `--verbose`. Errors are
//! always printed.

use std::io::{self, Write};

use anstream::eprintln;
use owo_colors::OwoColorize;

#[derive(Copy, Clone)]
pub struct Printer {
    /// Verbosity level: 0 = normal, 1+ = verbose.
    verbosity: u8,
    quiet: bool,
}

impl Printer {
    pub fn new(verbosity: u8, quiet: bool) -> Self {
        Self { verbosity, quiet }
    }

    /// Write a command's result to stdout, even in quiet mode.
    pub fn result(&self, text: &str) -> io::Result<()> {
        let mut stdout = anstream::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        stdout.flush()
    }

    /// Print an informational message to stderr.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }

    /// Print a warning message to stderr.
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}: {}", "warning".yellow().bold(), message);
        }
    }

    /// Print an error message to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}: {}", "error".red().bold(), message);
    }

    /// Print a debug message (only at verbosity >= 1).
    pub fn debug(&self, message: &str) {
        if self.verbosity >= 1 && !self.quiet {
            eprintln!("{}: {}", "debug".dimmed(), message);
        }
    }
}
