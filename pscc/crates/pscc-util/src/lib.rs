//! pscc-util - Shared compiler infrastructure.
//!
//! This crate holds the pieces every phase of the pipeline needs:
//!
//! - [`diagnostic`] - error and warning reporting (the `Handler` is shared
//!   by the lexer, parser, and code generator)
//! - [`error`] - the top-level error type the driver surfaces
//!
//! The compiler reports positions as line numbers only; there is no span or
//! column machinery here beyond what the diagnostics need to print
//! `error [line N]: ...`.

pub mod diagnostic;
pub mod error;

pub use diagnostic::{Diagnostic, DiagnosticBuilder, Handler, Level};
pub use error::CompileError;
