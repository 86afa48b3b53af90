//! Diagnostics for the Hadzik compiler.
//!
//! Every stage of the compiler (lexer, parser, type checker, code generator)
//! shares a single [`Diagnostics`] instance. There is exactly one way to
//! report a user-facing problem: [`Diagnostics::error`], which prints a
//! pointer-to-line excerpt and terminates the process. No stage recovers
//! from an error.

use std::cell::Cell;
use std::fmt;

use colored::Colorize;

use crate::lexer::Token;

/// Closed set of diagnostic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Value,
    Type,
    Parsing,
    Generator,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Value => "Value",
            ErrorKind::Type => "Type",
            ErrorKind::Parsing => "Parsing",
            ErrorKind::Generator => "Generator",
        }
    }

    /// Slovak dialect rendering of the kind name, used when `-s` is passed.
    fn dialect_label(self) -> &'static str {
        match self {
            ErrorKind::Syntax => "NapisanePlano",
            ErrorKind::Value => "HodnotaPlana",
            ErrorKind::Type => "TypPlany",
            ErrorKind::Parsing => "DzelenePlane",
            ErrorKind::Generator => "VyrobaPlana",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A source location, either carried by a [`Token`] or supplied explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub col: usize,
}

impl From<&Token> for Location {
    fn from(token: &Token) -> Self {
        Location {
            line: token.line,
            col: token.col,
        }
    }
}

impl From<(usize, usize)> for Location {
    fn from((line, col): (usize, usize)) -> Self {
        Location { line, col }
    }
}

pub struct Diagnostics {
    file_path: String,
    source: String,
    dialect: bool,
    debug: bool,
    // The location of the *last* reported or tracked position, reused when
    // a caller raises an error without an explicit location.
    line_number: Cell<usize>,
    column_number: Cell<usize>,
}

impl Diagnostics {
    pub fn new(file_path: impl Into<String>, source: impl Into<String>, dialect: bool, debug: bool) -> Self {
        Self {
            file_path: file_path.into(),
            source: source.into(),
            dialect,
            debug,
            line_number: Cell::new(1),
            column_number: Cell::new(0),
        }
    }

    pub fn debug_enabled(&self) -> bool {
        self.debug
    }

    fn line_text(&self, line: usize) -> &str {
        let mut lines = self.source.lines();
        lines
            .nth(line.saturating_sub(1))
            .unwrap_or_else(|| self.source.lines().last().unwrap_or(""))
    }

    /// Reports a diagnostic and terminates the process with a non-zero
    /// status. Never returns.
    pub fn error(&self, kind: ErrorKind, message: impl AsRef<str>, location: Option<Location>) -> ! {
        if let Some(loc) = location {
            self.line_number.set(loc.line);
            self.column_number.set(loc.col);
        }

        let line = self.line_number.get();
        let col = self.column_number.get();
        let error_line = self.line_text(line);

        eprintln!("Failed here: {}:{}:{}", self.file_path, line, col);
        eprintln!("{error_line}");

        let col_report = if location.is_some() {
            eprintln!("{:>width$}", "^", width = col.max(1));
            if self.dialect {
                format!(" stlupik {col}")
            } else {
                format!(" column {col}")
            }
        } else {
            eprintln!("{}", "^".repeat(error_line.len()));
            String::new()
        };

        let message = message.as_ref();
        if self.dialect {
            eprintln!(
                "Joj bysťu {}: (lajna {line}{col_report}) {message}",
                kind.dialect_label().red()
            );
        } else {
            eprintln!("{}: (line {line}{col_report}) {message}", format!("{kind}Error").red());
        }

        std::process::exit(1);
    }
}
