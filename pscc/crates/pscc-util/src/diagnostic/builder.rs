//! Fluent construction of diagnostics.

use super::{Diagnostic, Handler, Level};

/// Builder for diagnostics with optional fields.
///
/// # Examples
///
/// ```
/// use pscc_util::diagnostic::{DiagnosticBuilder, Handler};
///
/// let handler = Handler::new_quiet();
/// DiagnosticBuilder::error("DIV requires INTEGER operands")
///     .line(4)
///     .emit(&handler);
/// assert!(handler.has_errors());
/// ```
pub struct DiagnosticBuilder {
    level: Level,
    message: String,
    line: Option<u32>,
}

impl DiagnosticBuilder {
    /// Starts an error-level diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
            line: None,
        }
    }

    /// Starts a warning-level diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
            line: None,
        }
    }

    /// Attaches a source line.
    pub fn line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Finishes the diagnostic without emitting it.
    pub fn build(self) -> Diagnostic {
        Diagnostic::new(self.level, self.message, self.line)
    }

    /// Builds and emits through the given handler.
    pub fn emit(self, handler: &Handler) {
        handler.emit(self.build());
    }
}
