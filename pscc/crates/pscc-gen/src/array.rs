//! Multi-dimensional array lowering.
//!
//! An array declaration evaluates all bounds, computes the element count,
//! and heap-allocates `count * sizeof(elem)` bytes through `malloc`. The
//! data pointer lives in an entry-block slot; rank, bounds, and row-major
//! multipliers are recorded once and never change.
//!
//! Element addressing is a flat offset: `Σ (i_k - lower_k) * mult_k`, with
//! `mult[rank-1] == 1` and `mult[i] = mult[i+1] * dim_size[i+1]`. Every
//! element load or store is preceded by a per-dimension bounds check.
//!
//! OUTPUT of a bare array name, or of an access that supplies fewer
//! indices than the rank, prints the remaining dimensions in row-major
//! order through synthesized loops.

use inkwell::types::BasicType;
use inkwell::values::{BasicValueEnum, IntValue, PointerValue};
use inkwell::{AddressSpace, IntPredicate};

use pscc_par::{Expr, TypeTag};

use crate::codegen::{is_bool, is_int};
use crate::error::Result;
use crate::scope::{ArrayInfo, Slot};
use crate::CodeGen;

impl<'ctx> CodeGen<'ctx> {
    /// `DECLARE name : ARRAY[lb:ub, ...] OF elem`
    pub(crate) fn emit_array_declare(
        &mut self,
        name: &str,
        elem: TypeTag,
        bounds: &[(Expr, Expr)],
    ) -> Result<()> {
        let i64_type = self.context.i64_type();
        let one = i64_type.const_int(1, false);

        let mut lowers = Vec::with_capacity(bounds.len());
        let mut uppers = Vec::with_capacity(bounds.len());
        let mut dim_sizes = Vec::with_capacity(bounds.len());
        let mut total = one;

        for (lower, upper) in bounds {
            let Some(lower) = self.emit_index_value(lower, "array bound")? else {
                return Ok(());
            };
            let Some(upper) = self.emit_index_value(upper, "array bound")? else {
                return Ok(());
            };

            let diff = self.builder.build_int_sub(upper, lower, "dim_diff")?;
            let size = self.builder.build_int_add(diff, one, "dim_size")?;

            lowers.push(lower);
            uppers.push(upper);
            dim_sizes.push(size);
            total = self.builder.build_int_mul(total, size, "total_elems")?;
        }

        let rank = bounds.len();
        let mut mults = vec![one; rank];
        for i in (0..rank.saturating_sub(1)).rev() {
            mults[i] = self
                .builder
                .build_int_mul(mults[i + 1], dim_sizes[i + 1], "mult")?;
        }

        let elem_size = i64_type.const_int(elem_byte_size(elem), false);
        let total_bytes = self.builder.build_int_mul(total, elem_size, "total_bytes")?;

        let malloc = self.malloc_fn();
        let raw = self
            .builder
            .build_call(malloc, &[total_bytes.into()], "arr_mem")?;
        let raw = self.call_value(raw)?.into_pointer_value();

        let elem_ptr_type = self.basic_type(elem).ptr_type(AddressSpace::default());
        let data = self
            .builder
            .build_pointer_cast(raw, elem_ptr_type, "arr_data")?;

        let slot_ptr = self.entry_alloca(elem_ptr_type.into(), name)?;
        self.builder.build_store(slot_ptr, data)?;

        self.symbols.define(
            name,
            Slot::Array {
                ptr: slot_ptr,
                info: ArrayInfo {
                    elem,
                    lowers,
                    uppers,
                    mults,
                },
            },
        );
        Ok(())
    }

    /// Reads one element, bounds-checked per dimension.
    pub(crate) fn emit_array_access(
        &mut self,
        name: &str,
        indices: &[Expr],
        line: u32,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let Some((slot_ptr, info)) = self.resolve_array(name) else {
            return Ok(None);
        };

        let Some(index_values) = self.emit_checked_indices(&info, indices, name, line)? else {
            return Ok(None);
        };

        let elem_ptr = self.element_ptr(slot_ptr, &info, &index_values)?;
        let value = self
            .builder
            .build_load(elem_ptr, "elem")?;
        Ok(Some(value))
    }

    /// `name[i, j] <- value`, bounds-checked per dimension.
    pub(crate) fn emit_array_assign(
        &mut self,
        name: &str,
        indices: &[Expr],
        value: &Expr,
        line: u32,
    ) -> Result<()> {
        let Some((slot_ptr, info)) = self.resolve_array(name) else {
            return Ok(());
        };

        let Some(index_values) = self.emit_checked_indices(&info, indices, name, line)? else {
            return Ok(());
        };

        let Some(value) = self.emit_expr(value)? else {
            return Ok(());
        };
        let Some(value) = self.coerce_to(value, info.elem, name)? else {
            return Ok(());
        };

        let elem_ptr = self.element_ptr(slot_ptr, &info, &index_values)?;
        self.builder.build_store(elem_ptr, value)?;
        Ok(())
    }

    /// Prints a whole array or the tail dimensions of a partial access.
    ///
    /// Returns false when the operand is not an array at all, or when the
    /// access is fully indexed - those fall through to the ordinary path.
    pub(crate) fn try_array_output(&mut self, expr: &Expr) -> Result<bool> {
        let (name, given, line) = match expr {
            Expr::Var(name) => (name.as_str(), &[] as &[Expr], 0),
            Expr::ArrayAccess {
                name,
                indices,
                line,
            } => (name.as_str(), indices.as_slice(), *line),
            _ => return Ok(false),
        };

        let Some(Slot::Array { ptr, info }) = self.symbols.resolve(name).cloned() else {
            return Ok(false);
        };

        if given.len() >= info.rank() {
            // Fully indexed: an ordinary element read.
            return Ok(false);
        }

        let mut prefix = Vec::with_capacity(given.len());
        for (k, index) in given.iter().enumerate() {
            let Some(index) = self.emit_index_value(index, "array index")? else {
                return Ok(true);
            };
            self.emit_index_check(index, info.lowers[k], info.uppers[k], line)?;
            prefix.push(index);
        }

        self.emit_print_loop(ptr, &info, prefix)?;
        Ok(true)
    }

    /// Recursive nested-loop printer, row-major.
    ///
    /// The terminal state (all dimensions fixed) prints one element with
    /// the element type's format and returns up the stack.
    fn emit_print_loop(
        &mut self,
        slot_ptr: PointerValue<'ctx>,
        info: &ArrayInfo<'ctx>,
        indices: Vec<IntValue<'ctx>>,
    ) -> Result<()> {
        let dim = indices.len();
        if dim == info.rank() {
            let elem_ptr = self.element_ptr(slot_ptr, info, &indices)?;
            let value = self
                .builder
                .build_load(elem_ptr, "elem")?;
            return self.emit_output_value(value);
        }

        let i64_type = self.context.i64_type();
        let function = self.current_function()?;
        let loop_bb = self.context.append_basic_block(function, "arr_loop");
        let after_bb = self.context.append_basic_block(function, "arr_after");

        let idx_ptr = self.entry_alloca(i64_type.into(), "idx")?;
        self.builder.build_store(idx_ptr, info.lowers[dim])?;
        self.builder.build_unconditional_branch(loop_bb)?;

        self.builder.position_at_end(loop_bb);
        let current = self
            .builder
            .build_load(idx_ptr, "idx")?
            .into_int_value();

        let mut next_indices = indices;
        next_indices.push(current);
        self.emit_print_loop(slot_ptr, info, next_indices)?;

        let next = self
            .builder
            .build_int_add(current, i64_type.const_int(1, false), "idx_next")?;
        self.builder.build_store(idx_ptr, next)?;
        let keep_going =
            self.builder
                .build_int_compare(IntPredicate::SLE, next, info.uppers[dim], "arr_cond")?;
        self.builder
            .build_conditional_branch(keep_going, loop_bb, after_bb)?;

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// Resolves a name that must be an array, reporting otherwise.
    fn resolve_array(&mut self, name: &str) -> Option<(PointerValue<'ctx>, ArrayInfo<'ctx>)> {
        match self.symbols.resolve(name).cloned() {
            Some(Slot::Array { ptr, info }) => Some((ptr, info)),
            Some(_) => {
                self.handler
                    .error(format!("`{}` is not an array", name));
                None
            },
            None => {
                self.handler.error(format!("unknown array `{}`", name));
                None
            },
        }
    }

    /// Evaluates and bounds-checks a full index list.
    fn emit_checked_indices(
        &mut self,
        info: &ArrayInfo<'ctx>,
        indices: &[Expr],
        name: &str,
        line: u32,
    ) -> Result<Option<Vec<IntValue<'ctx>>>> {
        if indices.len() != info.rank() {
            self.handler.error_at(
                line,
                format!(
                    "array `{}` has {} dimension(s) but {} index(es) were given",
                    name,
                    info.rank(),
                    indices.len()
                ),
            );
            return Ok(None);
        }

        let mut values = Vec::with_capacity(indices.len());
        for (k, index) in indices.iter().enumerate() {
            let Some(index) = self.emit_index_value(index, "array index")? else {
                return Ok(None);
            };
            self.emit_index_check(index, info.lowers[k], info.uppers[k], line)?;
            values.push(index);
        }
        Ok(Some(values))
    }

    /// The address of one element under the flat row-major offset.
    fn element_ptr(
        &mut self,
        slot_ptr: PointerValue<'ctx>,
        info: &ArrayInfo<'ctx>,
        indices: &[IntValue<'ctx>],
    ) -> Result<PointerValue<'ctx>> {
        let i64_type = self.context.i64_type();
        let mut offset = i64_type.const_zero();

        for (k, index) in indices.iter().enumerate() {
            let diff = self
                .builder
                .build_int_sub(*index, info.lowers[k], "idx_rel")?;
            let term = self.builder.build_int_mul(diff, info.mults[k], "idx_term")?;
            offset = self.builder.build_int_add(offset, term, "flat_idx")?;
        }

        let elem_ptr_type = self.basic_type(info.elem).ptr_type(AddressSpace::default());
        let data = self
            .builder
            .build_load(slot_ptr, "arr_data")?
            .into_pointer_value();

        let elem_ptr = unsafe {
            self.builder
                .build_gep(data, &[offset], "elem_ptr")?
        };
        Ok(elem_ptr)
    }

    /// Evaluates an expression that must be usable as an i64 index/bound.
    pub(crate) fn emit_index_value(
        &mut self,
        expr: &Expr,
        what: &str,
    ) -> Result<Option<IntValue<'ctx>>> {
        let Some(value) = self.emit_expr(expr)? else {
            return Ok(None);
        };

        if is_int(&value) {
            return Ok(Some(value.into_int_value()));
        }
        if is_bool(&value) {
            let widened = self.builder.build_int_z_extend(
                value.into_int_value(),
                self.context.i64_type(),
                "booltoint",
            )?;
            return Ok(Some(widened));
        }
        self.handler
            .error(format!("{} must be an INTEGER value", what));
        Ok(None)
    }
}

/// Bytes per element for each representation.
fn elem_byte_size(elem: TypeTag) -> u64 {
    match elem {
        TypeTag::Integer | TypeTag::Real => 8,
        TypeTag::Boolean => 1,
        TypeTag::String | TypeTag::Void => 8,
    }
}
