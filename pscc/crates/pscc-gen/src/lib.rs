//! pscc-gen - Typed LLVM IR emission for exam-style pseudocode.
//!
//! The generator walks the parsed statement list and lowers it into an
//! LLVM module via inkwell:
//!
//! ```text
//! [AST]
//!   │
//!   ▼
//! [CodeGen] ──▶ scope management, statement dispatch, control flow
//!   │   ├─ types    - primitive representations, slots, literals
//!   │   ├─ arith    - operator lowering and numeric coercion
//!   │   ├─ array    - metadata, flat indexing, bounds checks, printing
//!   │   ├─ func     - prototypes, BYREF/BYVAL, call sites, RETURN
//!   │   ├─ strings  - STRING slots and intrinsics
//!   │   └─ runtime  - C externs and guarded error+exit sequences
//!   ▼
//! [LLVM module] ──▶ verified and printed by the driver
//! ```
//!
//! Semantic errors (unknown names, bad operand types, arity mismatches)
//! are reported through the shared [`pscc_util::Handler`] and the
//! offending construct is dropped; emission carries on so one mistake
//! does not hide the next. The resulting module is always structurally
//! valid - every block terminated - even for erroneous input.

mod arith;
mod array;
mod codegen;
pub mod error;
mod func;
mod runtime;
pub mod scope;
mod strings;
#[cfg(test)]
mod tests;
mod types;

pub use codegen::CodeGen;
pub use error::{CodeGenError, Result};
