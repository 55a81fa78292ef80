//! pscc-drv - Compiler driver.
//!
//! The driver owns the pipeline and the process surface:
//!
//! ```text
//! stdin (source text)
//!     │
//!     ▼
//! [pscc-lex]  ──▶ tokens (pulled one at a time by the parser)
//!     │
//!     ▼
//! [pscc-par]  ──▶ best-effort statement list
//!     │
//!     ▼
//! [pscc-gen]  ──▶ LLVM module
//!     │
//!     ▼
//! stderr (IR text) + verifier ──▶ exit code
//! ```
//!
//! There are no flags and no file arguments: source comes in on stdin,
//! the IR dump goes to stderr (stdout stays free for whatever the
//! compiled program will eventually do), and the exit code is 0 unless
//! the LLVM verifier rejects the emitted module.

use std::io::Read;

use anyhow::Context as _;
use inkwell::context::Context;

use pscc_gen::CodeGen;
use pscc_par::Parser;
use pscc_util::{CompileError, Handler};

/// One compiler invocation: a diagnostic handler plus the pipeline.
pub struct Session {
    handler: Handler,
}

impl Session {
    /// Creates a session that prints diagnostics as they happen.
    pub fn new() -> Self {
        Self {
            handler: Handler::new(),
        }
    }

    /// Reads the source from stdin and compiles it.
    pub fn run(&self) -> anyhow::Result<()> {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(CompileError::Io)
            .context("reading standard input")?;

        self.compile(&source)?;
        Ok(())
    }

    /// Runs the pipeline over one source text.
    ///
    /// The IR dump is written before verification, so a rejected module
    /// is still visible for inspection.
    pub fn compile(&self, source: &str) -> Result<(), CompileError> {
        let program = Parser::new(source, &self.handler).parse();

        let context = Context::create();
        let mut codegen = CodeGen::new(&context, "pscc_module", &self.handler);
        codegen
            .compile(&program)
            .map_err(|error| CompileError::Codegen(error.to_string()))?;

        codegen.module.print_to_stderr();

        codegen
            .module
            .verify()
            .map_err(|message| CompileError::VerifyFailed(message.to_string()))?;

        Ok(())
    }

    /// Number of error diagnostics reported so far.
    pub fn error_count(&self) -> usize {
        self.handler.error_count()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
