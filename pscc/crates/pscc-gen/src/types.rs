//! Primitive type handling: representations, literals, and scalar slots.
//!
//! Representations: INTEGER is a 64-bit signed integer, REAL an IEEE 754
//! double, BOOLEAN a 1-bit integer, STRING a byte pointer. Declaration
//! allocates an entry-block slot and stores the type's zero (the empty
//! string literal for STRING). Nothing here coerces; coercion belongs to
//! the arithmetic rules.

use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, FloatValue, IntValue};
use inkwell::AddressSpace;

use pscc_par::TypeTag;

use crate::error::Result;
use crate::scope::Slot;
use crate::CodeGen;

impl<'ctx> CodeGen<'ctx> {
    /// Maps a type tag to its LLVM representation.
    ///
    /// VOID has no basic type and only appears in return position; callers
    /// building function types handle it separately.
    pub(crate) fn basic_type(&self, ty: TypeTag) -> BasicTypeEnum<'ctx> {
        match ty {
            TypeTag::Integer => self.context.i64_type().into(),
            TypeTag::Real => self.context.f64_type().into(),
            TypeTag::Boolean => self.context.bool_type().into(),
            TypeTag::String | TypeTag::Void => self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into(),
        }
    }

    /// Materializes an integer literal.
    pub(crate) fn const_int(&self, value: i64) -> IntValue<'ctx> {
        self.context.i64_type().const_int(value as u64, true)
    }

    /// Materializes a real literal.
    pub(crate) fn const_real(&self, value: f64) -> FloatValue<'ctx> {
        self.context.f64_type().const_float(value)
    }

    /// Materializes a boolean literal.
    pub(crate) fn const_bool(&self, value: bool) -> IntValue<'ctx> {
        self.context.bool_type().const_int(value as u64, false)
    }

    /// The zero value a freshly declared slot is initialized with.
    pub(crate) fn zero_value(&mut self, ty: TypeTag) -> Result<BasicValueEnum<'ctx>> {
        let zero = match ty {
            TypeTag::Integer => self.context.i64_type().const_zero().into(),
            TypeTag::Real => self.context.f64_type().const_zero().into(),
            TypeTag::Boolean => self.context.bool_type().const_zero().into(),
            TypeTag::String | TypeTag::Void => self.cstring("", "str_empty")?.into(),
        };
        Ok(zero)
    }

    /// `DECLARE name : ty` - entry-block slot, zero-initialized, registered.
    pub(crate) fn declare_scalar(&mut self, name: &str, ty: TypeTag) -> Result<()> {
        if ty == TypeTag::Void {
            self.handler
                .error(format!("`{}` cannot be declared with type VOID", name));
            return Ok(());
        }

        let ptr = self.entry_alloca(self.basic_type(ty), name)?;
        let zero = self.zero_value(ty)?;
        self.builder.build_store(ptr, zero)?;
        self.symbols.define(name, Slot::Scalar { ptr, ty });
        Ok(())
    }
}
