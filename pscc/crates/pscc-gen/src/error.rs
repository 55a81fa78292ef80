//! Error types for LLVM code generation.
//!
//! Semantic problems in the input (undeclared names, bad operand types)
//! are diagnostics, not errors: they are reported through the handler and
//! the offending construct is dropped. `CodeGenError` is reserved for
//! failures of the emission machinery itself.

use thiserror::Error;

/// Error type for LLVM code generation.
#[derive(Debug, Error)]
pub enum CodeGenError {
    /// An LLVM builder operation failed.
    #[error("LLVM operation failed: {0}")]
    Builder(#[from] inkwell::builder::BuilderError),

    /// Emission was attempted with no current basic block.
    #[error("no insertion point while emitting {0}")]
    NoInsertPoint(&'static str),

    /// The emitter produced an impossible shape - a bug, not bad input.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

/// Result type alias for code generation operations.
pub type Result<T> = std::result::Result<T, CodeGenError>;
