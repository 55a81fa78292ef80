//! Scoped symbol table with heterogeneous storage slots.
//!
//! Every named value lives in a [`Slot`]:
//!
//! - `Scalar` - an entry-block alloca holding the value
//! - `Array` - an entry-block alloca holding the data pointer, plus the
//!   metadata fixed at declaration time
//! - `Ref` - a BYREF parameter: the caller's pointer, no extra indirection
//!
//! The table is an explicit stack of frames. Function boundaries swap the
//! whole stack out and back in, so a body never sees the caller's names.

use std::collections::HashMap;

use inkwell::values::{IntValue, PointerValue};
use pscc_par::TypeTag;

/// Metadata for a declared array, computed once at declaration.
///
/// Bounds and multipliers are SSA values (constants for literal bounds)
/// valid inside the function that declared the array - which is the only
/// place the name is in scope.
#[derive(Clone)]
pub struct ArrayInfo<'ctx> {
    /// Element type tag; decides representation and print format.
    pub elem: TypeTag,
    /// Per-dimension lower bounds, as i64 values.
    pub lowers: Vec<IntValue<'ctx>>,
    /// Per-dimension upper bounds, as i64 values.
    pub uppers: Vec<IntValue<'ctx>>,
    /// Row-major multipliers: `mults[rank-1] == 1`.
    pub mults: Vec<IntValue<'ctx>>,
}

impl<'ctx> ArrayInfo<'ctx> {
    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.lowers.len()
    }
}

/// An addressable storage location for a named variable.
#[derive(Clone)]
pub enum Slot<'ctx> {
    /// Scalar storage: address of the value.
    Scalar {
        ptr: PointerValue<'ctx>,
        ty: TypeTag,
    },
    /// Array storage: address of the data pointer, plus metadata.
    Array {
        ptr: PointerValue<'ctx>,
        info: ArrayInfo<'ctx>,
    },
    /// BYREF parameter: the incoming pointer itself.
    Ref {
        ptr: PointerValue<'ctx>,
        ty: TypeTag,
    },
}

/// The scoped name → slot mapping shared by the code generator and its
/// helpers.
pub struct SymbolTable<'ctx> {
    frames: Vec<HashMap<String, Slot<'ctx>>>,
}

impl<'ctx> SymbolTable<'ctx> {
    /// Creates a table with the top-level frame.
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    /// Binds a name in the innermost frame.
    ///
    /// Re-declaration overwrites: the previous slot becomes unreachable,
    /// matching the one-slot-per-name-in-scope invariant.
    pub fn define(&mut self, name: impl Into<String>, slot: Slot<'ctx>) {
        self.frames
            .last_mut()
            .expect("symbol table always has a frame")
            .insert(name.into(), slot);
    }

    /// Looks a name up, innermost frame first.
    pub fn resolve(&self, name: &str) -> Option<&Slot<'ctx>> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Swaps in a fresh, empty stack for a function body.
    ///
    /// Returns the saved stack; pass it back to [`Self::exit_function`]
    /// when the body is done.
    pub fn enter_function(&mut self) -> Vec<HashMap<String, Slot<'ctx>>> {
        std::mem::replace(&mut self.frames, vec![HashMap::new()])
    }

    /// Restores the stack saved by [`Self::enter_function`].
    pub fn exit_function(&mut self, saved: Vec<HashMap<String, Slot<'ctx>>>) {
        self.frames = saved;
    }
}

impl<'ctx> Default for SymbolTable<'ctx> {
    fn default() -> Self {
        Self::new()
    }
}
