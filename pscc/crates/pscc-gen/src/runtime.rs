//! Runtime externs and guarded check sequences.
//!
//! Declares the C runtime functions the emitted IR leans on, interns the
//! string globals, and provides the two guard emitters: division by zero
//! and array bounds. A guard lowers to
//!
//! ```text
//!   br cond, fail, cont
//! fail:
//!   printf(message, line)
//!   exit(1)
//!   unreachable
//! cont:
//!   ; insertion continues here
//! ```

use inkwell::module::Linkage;
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::{AddressSpace, FloatPredicate, IntPredicate};

use crate::codegen::{is_int, is_real};
use crate::error::Result;
use crate::CodeGen;

impl<'ctx> CodeGen<'ctx> {
    /// Gets or declares a runtime function by name.
    fn runtime_fn(
        &self,
        name: &str,
        make: impl FnOnce(&Self) -> inkwell::types::FunctionType<'ctx>,
    ) -> FunctionValue<'ctx> {
        if let Some(function) = self.module.get_function(name) {
            return function;
        }
        self.module
            .add_function(name, make(self), Some(Linkage::External))
    }

    /// `printf(i8*, ...) -> i32`
    pub(crate) fn printf_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("printf", |cg| {
            let i8_ptr = cg.context.i8_type().ptr_type(AddressSpace::default());
            cg.context.i32_type().fn_type(&[i8_ptr.into()], true)
        })
    }

    /// `scanf(i8*, ...) -> i32`
    pub(crate) fn scanf_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("scanf", |cg| {
            let i8_ptr = cg.context.i8_type().ptr_type(AddressSpace::default());
            cg.context.i32_type().fn_type(&[i8_ptr.into()], true)
        })
    }

    /// `malloc(i64) -> i8*`
    pub(crate) fn malloc_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("malloc", |cg| {
            let i8_ptr = cg.context.i8_type().ptr_type(AddressSpace::default());
            i8_ptr.fn_type(&[cg.context.i64_type().into()], false)
        })
    }

    /// `free(i8*)` - declared for completeness of the runtime surface.
    pub(crate) fn free_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("free", |cg| {
            let i8_ptr = cg.context.i8_type().ptr_type(AddressSpace::default());
            cg.context.void_type().fn_type(&[i8_ptr.into()], false)
        })
    }

    /// `exit(i32)`
    pub(crate) fn exit_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("exit", |cg| {
            cg.context
                .void_type()
                .fn_type(&[cg.context.i32_type().into()], false)
        })
    }

    /// `strlen(i8*) -> i64`
    pub(crate) fn strlen_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("strlen", |cg| {
            let i8_ptr = cg.context.i8_type().ptr_type(AddressSpace::default());
            cg.context.i64_type().fn_type(&[i8_ptr.into()], false)
        })
    }

    /// `memcpy(i8*, i8*, i64) -> i8*`
    pub(crate) fn memcpy_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("memcpy", |cg| {
            let i8_ptr = cg.context.i8_type().ptr_type(AddressSpace::default());
            i8_ptr.fn_type(
                &[i8_ptr.into(), i8_ptr.into(), cg.context.i64_type().into()],
                false,
            )
        })
    }

    /// `toupper(i32) -> i32`
    pub(crate) fn toupper_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("toupper", |cg| {
            cg.context
                .i32_type()
                .fn_type(&[cg.context.i32_type().into()], false)
        })
    }

    /// `tolower(i32) -> i32`
    pub(crate) fn tolower_fn(&self) -> FunctionValue<'ctx> {
        self.runtime_fn("tolower", |cg| {
            cg.context
                .i32_type()
                .fn_type(&[cg.context.i32_type().into()], false)
        })
    }

    /// Declares the whole runtime surface up front.
    ///
    /// The emitted module always references the same nine externs, whether
    /// or not a particular program exercises them.
    pub(crate) fn declare_runtime(&self) {
        let _ = self.printf_fn();
        let _ = self.scanf_fn();
        let _ = self.malloc_fn();
        let _ = self.free_fn();
        let _ = self.exit_fn();
        let _ = self.strlen_fn();
        let _ = self.memcpy_fn();
        let _ = self.toupper_fn();
        let _ = self.tolower_fn();
    }

    /// Interns a C string global, one per distinct contents.
    pub(crate) fn cstring(&mut self, value: &str, name: &str) -> Result<PointerValue<'ctx>> {
        if let Some(ptr) = self.cstrings.get(value) {
            return Ok(*ptr);
        }
        let global = self.builder.build_global_string_ptr(value, name)?;
        let ptr = global.as_pointer_value();
        self.cstrings.insert(value.to_string(), ptr);
        Ok(ptr)
    }

    /// Emits the printf+exit+unreachable arm behind `condition`.
    ///
    /// The continue block becomes the new insertion point.
    fn emit_guard(
        &mut self,
        condition: IntValue<'ctx>,
        message: PointerValue<'ctx>,
        line: u32,
    ) -> Result<()> {
        let function = self.current_function()?;
        let fail_bb = self.context.append_basic_block(function, "check_fail");
        let cont_bb = self.context.append_basic_block(function, "check_cont");

        self.builder
            .build_conditional_branch(condition, fail_bb, cont_bb)?;

        self.builder.position_at_end(fail_bb);
        let printf = self.printf_fn();
        let line_value = self.context.i32_type().const_int(line as u64, false);
        self.builder
            .build_call(printf, &[message.into(), line_value.into()], "")?;
        let exit = self.exit_fn();
        let one = self.context.i32_type().const_int(1, false);
        self.builder.build_call(exit, &[one.into()], "")?;
        self.builder.build_unreachable()?;

        self.builder.position_at_end(cont_bb);
        Ok(())
    }

    /// Division-by-zero guard, type-directed on the divisor.
    pub(crate) fn emit_div_zero_check(
        &mut self,
        divisor: BasicValueEnum<'ctx>,
        line: u32,
    ) -> Result<()> {
        let is_zero = if is_real(&divisor) {
            self.builder.build_float_compare(
                FloatPredicate::OEQ,
                divisor.into_float_value(),
                self.context.f64_type().const_zero(),
                "is_zero",
            )?
        } else if is_int(&divisor) {
            self.builder.build_int_compare(
                IntPredicate::EQ,
                divisor.into_int_value(),
                self.context.i64_type().const_zero(),
                "is_zero",
            )?
        } else {
            // Boolean divisors arrive widened; anything else was already
            // rejected by the operand checks.
            return Ok(());
        };

        let message = self.cstring("[Fatal] line %d: Division by zero\n", "err_div_zero")?;
        self.emit_guard(is_zero, message, line)
    }

    /// Array bounds guard: `index < lower || index > upper` fails.
    pub(crate) fn emit_index_check(
        &mut self,
        index: IntValue<'ctx>,
        lower: IntValue<'ctx>,
        upper: IntValue<'ctx>,
        line: u32,
    ) -> Result<()> {
        let too_low =
            self.builder
                .build_int_compare(IntPredicate::SLT, index, lower, "too_low")?;
        let too_high =
            self.builder
                .build_int_compare(IntPredicate::SGT, index, upper, "too_high")?;
        let out_of_bounds = self.builder.build_or(too_low, too_high, "out_of_bounds")?;

        let message = self.cstring(
            "[Fatal] line %d: Array index out of bounds\n",
            "err_bounds",
        )?;
        self.emit_guard(out_of_bounds, message, line)
    }
}
