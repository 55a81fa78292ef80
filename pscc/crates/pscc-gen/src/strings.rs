//! String intrinsics against the C runtime.
//!
//! Strings are null-terminated byte pointers. There are no string
//! operators in the surface language; values flow through the intrinsics:
//!
//! - `LENGTH(s)` - `strlen`
//! - `MID(s, start, len)` - 1-based substring, clamped at both ends
//! - `RIGHT(s, len)` - trailing substring, clamped
//! - `LCASE(s)` / `UCASE(s)` - byte-wise case conversion via
//!   `tolower`/`toupper`
//!
//! The substring forms allocate `len + 1` bytes, copy with `memcpy`, and
//! null-terminate. Nothing is freed; allocations live until process exit.

use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::IntPredicate;

use pscc_par::Expr;

use crate::codegen::is_string;
use crate::error::Result;
use crate::CodeGen;

impl<'ctx> CodeGen<'ctx> {
    /// Whether a callee name is one of the built-in string functions.
    pub(crate) fn is_string_intrinsic(&self, name: &str) -> bool {
        matches!(name, "LENGTH" | "MID" | "RIGHT" | "LCASE" | "UCASE")
    }

    /// Lowers one intrinsic call. Arity and operand types are checked here;
    /// failures are reported and drop the call.
    pub(crate) fn emit_string_intrinsic(
        &mut self,
        name: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let expected = match name {
            "MID" => 3,
            "RIGHT" => 2,
            _ => 1,
        };
        if args.len() != expected {
            self.handler.error(format!(
                "`{}` expects {} argument(s) but {} were passed",
                name,
                expected,
                args.len()
            ));
            return Ok(None);
        }

        let Some(string) = self.emit_string_arg(&args[0], name)? else {
            return Ok(None);
        };

        match name {
            "LENGTH" => {
                let len = self.emit_strlen(string)?;
                Ok(Some(len.into()))
            },
            "MID" => {
                let Some(start) = self.emit_index_value(&args[1], "MID start")? else {
                    return Ok(None);
                };
                let Some(len) = self.emit_index_value(&args[2], "MID length")? else {
                    return Ok(None);
                };
                Ok(Some(self.emit_mid(string, start, len)?))
            },
            "RIGHT" => {
                let Some(len) = self.emit_index_value(&args[1], "RIGHT length")? else {
                    return Ok(None);
                };
                Ok(Some(self.emit_right(string, len)?))
            },
            "LCASE" => {
                let converted = self.emit_case_convert(string, self.tolower_fn(), "lcase")?;
                Ok(Some(converted))
            },
            "UCASE" => {
                let converted = self.emit_case_convert(string, self.toupper_fn(), "ucase")?;
                Ok(Some(converted))
            },
            _ => unreachable!("checked by is_string_intrinsic"),
        }
    }

    /// Evaluates an argument that must be a string.
    fn emit_string_arg(
        &mut self,
        expr: &Expr,
        intrinsic: &str,
    ) -> Result<Option<PointerValue<'ctx>>> {
        let Some(value) = self.emit_expr(expr)? else {
            return Ok(None);
        };
        if !is_string(&value) {
            self.handler
                .error(format!("`{}` expects a STRING argument", intrinsic));
            return Ok(None);
        }
        Ok(Some(value.into_pointer_value()))
    }

    /// `strlen(s)` as an i64.
    fn emit_strlen(&mut self, string: PointerValue<'ctx>) -> Result<IntValue<'ctx>> {
        let call = self
            .builder
            .build_call(self.strlen_fn(), &[string.into()], "len")?;
        Ok(self.call_value(call)?.into_int_value())
    }

    /// Allocates `len + 1` bytes for a substring result.
    fn emit_string_alloc(
        &mut self,
        len: IntValue<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let one = self.context.i64_type().const_int(1, false);
        let size = self.builder.build_int_add(len, one, "alloc_size")?;
        let call = self
            .builder
            .build_call(self.malloc_fn(), &[size.into()], name)?;
        Ok(self.call_value(call)?.into_pointer_value())
    }

    /// Byte address `base + offset`.
    fn emit_byte_ptr(
        &mut self,
        base: PointerValue<'ctx>,
        offset: IntValue<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let ptr = unsafe { self.builder.build_gep(base, &[offset], name)? };
        Ok(ptr)
    }

    /// Stores the terminating NUL at `base[offset]`.
    fn emit_null_terminate(
        &mut self,
        base: PointerValue<'ctx>,
        offset: IntValue<'ctx>,
    ) -> Result<()> {
        let nul_ptr = self.emit_byte_ptr(base, offset, "nul_ptr")?;
        self.builder
            .build_store(nul_ptr, self.context.i8_type().const_zero())?;
        Ok(())
    }

    /// `MID(s, start, len)` - 1-based start, clamped into `[0, strlen]`,
    /// length clamped into `[0, remaining]`.
    fn emit_mid(
        &mut self,
        string: PointerValue<'ctx>,
        start: IntValue<'ctx>,
        len: IntValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let i64_type = self.context.i64_type();
        let zero = i64_type.const_zero();
        let one = i64_type.const_int(1, false);

        let full_len = self.emit_strlen(string)?;
        let start0 = self.builder.build_int_sub(start, one, "start_idx")?;

        let is_neg = self
            .builder
            .build_int_compare(IntPredicate::SLT, start0, zero, "start_neg")?;
        let start0 = self
            .builder
            .build_select(is_neg, zero, start0, "start_clamped")?
            .into_int_value();

        let too_big =
            self.builder
                .build_int_compare(IntPredicate::SGT, start0, full_len, "start_past_end")?;
        let start0 = self
            .builder
            .build_select(too_big, full_len, start0, "start_clamped")?
            .into_int_value();

        let remaining = self.builder.build_int_sub(full_len, start0, "remaining")?;
        let len_too_big =
            self.builder
                .build_int_compare(IntPredicate::SGT, len, remaining, "len_past_end")?;
        let actual = self
            .builder
            .build_select(len_too_big, remaining, len, "len_clamped")?
            .into_int_value();

        let len_neg = self
            .builder
            .build_int_compare(IntPredicate::SLT, actual, zero, "len_neg")?;
        let actual = self
            .builder
            .build_select(len_neg, zero, actual, "len_clamped")?
            .into_int_value();

        let result = self.emit_string_alloc(actual, "mid_str_mem")?;
        let src = self.emit_byte_ptr(string, start0, "mid_src")?;
        self.builder.build_call(
            self.memcpy_fn(),
            &[result.into(), src.into(), actual.into()],
            "",
        )?;
        self.emit_null_terminate(result, actual)?;

        Ok(result.into())
    }

    /// `RIGHT(s, len)` - the trailing `len` bytes, clamped.
    fn emit_right(
        &mut self,
        string: PointerValue<'ctx>,
        len: IntValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        let i64_type = self.context.i64_type();
        let zero = i64_type.const_zero();

        let full_len = self.emit_strlen(string)?;
        let start = self.builder.build_int_sub(full_len, len, "right_start")?;

        let is_neg = self
            .builder
            .build_int_compare(IntPredicate::SLT, start, zero, "start_neg")?;
        let start = self
            .builder
            .build_select(is_neg, zero, start, "start_clamped")?
            .into_int_value();

        let actual = self.builder.build_int_sub(full_len, start, "right_len")?;

        let result = self.emit_string_alloc(actual, "right_str_mem")?;
        let src = self.emit_byte_ptr(string, start, "right_src")?;
        self.builder.build_call(
            self.memcpy_fn(),
            &[result.into(), src.into(), actual.into()],
            "",
        )?;
        self.emit_null_terminate(result, actual)?;

        Ok(result.into())
    }

    /// Byte-wise case conversion loop shared by LCASE and UCASE.
    fn emit_case_convert(
        &mut self,
        string: PointerValue<'ctx>,
        convert: FunctionValue<'ctx>,
        label: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        let i64_type = self.context.i64_type();
        let i8_type = self.context.i8_type();
        let i32_type = self.context.i32_type();
        let one = i64_type.const_int(1, false);

        let len = self.emit_strlen(string)?;
        let result = self.emit_string_alloc(len, label)?;

        let function = self.current_function()?;
        let loop_bb = self.context.append_basic_block(function, "case_loop");
        let body_bb = self.context.append_basic_block(function, "case_body");
        let after_bb = self.context.append_basic_block(function, "case_after");

        let idx_ptr = self.entry_alloca(i64_type.into(), "idx")?;
        self.builder.build_store(idx_ptr, i64_type.const_zero())?;
        self.builder.build_unconditional_branch(loop_bb)?;

        self.builder.position_at_end(loop_bb);
        let current = self
            .builder
            .build_load(idx_ptr, "idx")?
            .into_int_value();
        let in_range =
            self.builder
                .build_int_compare(IntPredicate::SLT, current, len, "case_cond")?;
        self.builder
            .build_conditional_branch(in_range, body_bb, after_bb)?;

        self.builder.position_at_end(body_bb);
        let src = self.emit_byte_ptr(string, current, "src_ptr")?;
        let byte = self.builder.build_load(src, "ch")?.into_int_value();
        let widened = self.builder.build_int_s_extend(byte, i32_type, "ch_ext")?;
        let converted_call = self
            .builder
            .build_call(convert, &[widened.into()], "ch_conv")?;
        let converted = self.call_value(converted_call)?.into_int_value();
        let narrowed = self
            .builder
            .build_int_truncate(converted, i8_type, "ch_narrow")?;
        let dst = self.emit_byte_ptr(result, current, "dst_ptr")?;
        self.builder.build_store(dst, narrowed)?;

        let next = self.builder.build_int_add(current, one, "idx_next")?;
        self.builder.build_store(idx_ptr, next)?;
        self.builder.build_unconditional_branch(loop_bb)?;

        self.builder.position_at_end(after_bb);
        self.emit_null_terminate(result, len)?;

        Ok(result.into())
    }
}
