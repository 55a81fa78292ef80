//! Diagnostic module - error and warning reporting infrastructure.
//!
//! Diagnostics carry a severity level, a message, and an optional source
//! line. They are printed to the error stream the moment they are emitted
//! (the IR dump also goes to stderr, so a failing compile interleaves its
//! complaints with whatever IR was produced) and collected on the handler
//! so later phases and tests can ask whether anything went wrong.
//!
//! # Examples
//!
//! ```
//! use pscc_util::diagnostic::{DiagnosticBuilder, Handler};
//!
//! let handler = Handler::new();
//! DiagnosticBuilder::error("unexpected token").line(3).emit(&handler);
//!
//! assert!(handler.has_errors());
//! assert_eq!(handler.error_count(), 1);
//! ```

mod builder;

pub use builder::DiagnosticBuilder;

use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// An error that prevents the offending construct from being lowered.
    Error,
    /// A warning that does not stop compilation.
    Warning,
    /// Additional information attached to a preceding diagnostic.
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Error => write!(f, "error"),
            Level::Warning => write!(f, "warning"),
            Level::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with severity and an optional source line.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level.
    pub level: Level,
    /// Main diagnostic message.
    pub message: String,
    /// Source line (1-based) the diagnostic refers to, when known.
    pub line: Option<u32>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    pub fn new(level: Level, message: impl Into<String>, line: Option<u32>) -> Self {
        Self {
            level,
            message: message.into(),
            line,
        }
    }

    /// Creates an error diagnostic without a line.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message, None)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} [line {}]: {}", self.level, line, self.message),
            None => write!(f, "{}: {}", self.level, self.message),
        }
    }
}

/// Collects and prints diagnostics for one compilation session.
///
/// The handler uses interior mutability so it can be shared by reference
/// between the lexer, the parser, and the code generator without threading
/// `&mut` through every call. The compiler is single-threaded, so a
/// `RefCell` is all that is needed.
pub struct Handler {
    /// Collected diagnostics, in emission order.
    diagnostics: RefCell<Vec<Diagnostic>>,
    /// Whether emitted diagnostics are printed to stderr immediately.
    print: bool,
}

impl Handler {
    /// Creates a new handler that prints diagnostics as they are emitted.
    pub fn new() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            print: true,
        }
    }

    /// Creates a handler that only collects, for tests that assert on
    /// diagnostics without polluting the test output.
    pub fn new_quiet() -> Self {
        Self {
            diagnostics: RefCell::new(Vec::new()),
            print: false,
        }
    }

    /// Emits a diagnostic.
    pub fn emit(&self, diagnostic: Diagnostic) {
        if self.print {
            eprintln!("{}", diagnostic);
        }
        self.diagnostics.borrow_mut().push(diagnostic);
    }

    /// Reports an error without a source line.
    pub fn error(&self, message: impl Into<String>) {
        self.emit(Diagnostic::new(Level::Error, message, None));
    }

    /// Reports an error at the given source line.
    pub fn error_at(&self, line: u32, message: impl Into<String>) {
        self.emit(Diagnostic::new(Level::Error, message, Some(line)));
    }

    /// Returns true if any error-level diagnostic has been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns the number of error-level diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.level == Level::Error)
            .count()
    }

    /// Returns a copy of every diagnostic emitted so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }
}

impl Default for Handler {
    fn default() -> Self {
        Self::new()
    }
}
