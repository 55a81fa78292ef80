//! Top-level error type surfaced by the driver.

use thiserror::Error;

/// Errors that abort a compilation session outright.
///
/// Most problems in the pipeline are reported as diagnostics and recovered
/// from; this type is reserved for conditions where there is nothing left
/// to continue with.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Standard input could not be read.
    #[error("failed to read source from stdin: {0}")]
    Io(#[from] std::io::Error),

    /// The emission machinery itself failed (not bad input).
    #[error("code generation failed: {0}")]
    Codegen(String),

    /// The LLVM verifier rejected the emitted module.
    #[error("module verification failed: {0}")]
    VerifyFailed(String),
}
