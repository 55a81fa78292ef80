//! Binary and unary operator lowering with numeric coercion.
//!
//! Coercion ladder, applied in order:
//!
//! 1. `/` promotes both operands to real and divides; integer division is
//!    spelled `DIV`.
//! 2. `DIV` / `MOD` require integer operands.
//! 3. `AND` / `OR` reduce both sides to i1 and combine bitwise.
//! 4. If either operand is real, the other is promoted; float arithmetic
//!    and ordered comparisons.
//! 5. Otherwise signed integer arithmetic and signed comparisons.
//!
//! Booleans entering numeric positions are zero-extended to i64 first.
//! Comparison results are i1. `/`, `DIV`, and `MOD` guard their divisor
//! through the runtime check before dividing.

use inkwell::values::{BasicValueEnum, FloatValue, IntValue};
use inkwell::{FloatPredicate, IntPredicate};

use pscc_par::{BinOp, Expr, UnOp};

use crate::codegen::{is_bool, is_int, is_real};
use crate::error::Result;
use crate::CodeGen;

impl<'ctx> CodeGen<'ctx> {
    /// Lowers a binary expression: operands first, then the operator.
    pub(crate) fn emit_binary_expr(
        &mut self,
        op: BinOp,
        lhs: &Expr,
        rhs: &Expr,
        line: u32,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let Some(lhs) = self.emit_expr(lhs)? else {
            return Ok(None);
        };
        let Some(rhs) = self.emit_expr(rhs)? else {
            return Ok(None);
        };
        self.emit_binary_op(op, lhs, rhs, line)
    }

    /// Applies one binary operator to two lowered values.
    pub(crate) fn emit_binary_op(
        &mut self,
        op: BinOp,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
        line: u32,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        if op == BinOp::Div {
            let Some(lhs) = self.to_numeric(lhs, "/")? else {
                return Ok(None);
            };
            let Some(rhs) = self.to_numeric(rhs, "/")? else {
                return Ok(None);
            };
            self.emit_div_zero_check(rhs, line)?;
            let lhs = self.promote_to_real(lhs)?;
            let rhs = self.promote_to_real(rhs)?;
            return Ok(Some(self.builder.build_float_div(lhs, rhs, "divtmp")?.into()));
        }

        if op == BinOp::IntDiv || op == BinOp::Mod {
            if !is_int(&lhs) || !is_int(&rhs) {
                self.handler.error_at(
                    line,
                    format!("{} requires INTEGER operands", if op == BinOp::IntDiv { "DIV" } else { "MOD" }),
                );
                return Ok(None);
            }
            let lhs = lhs.into_int_value();
            let rhs = rhs.into_int_value();
            self.emit_div_zero_check(rhs.into(), line)?;
            let result = match op {
                BinOp::IntDiv => self.builder.build_int_signed_div(lhs, rhs, "div_int_tmp")?,
                _ => self.builder.build_int_signed_rem(lhs, rhs, "mod_tmp")?,
            };
            return Ok(Some(result.into()));
        }

        if op == BinOp::And || op == BinOp::Or {
            let Some(lhs) = self.to_bool(lhs)? else {
                return Ok(None);
            };
            let Some(rhs) = self.to_bool(rhs)? else {
                return Ok(None);
            };
            let result = match op {
                BinOp::And => self.builder.build_and(lhs, rhs, "andtmp")?,
                _ => self.builder.build_or(lhs, rhs, "ortmp")?,
            };
            return Ok(Some(result.into()));
        }

        let spelling = op.to_string();
        let Some(lhs) = self.to_numeric(lhs, &spelling)? else {
            return Ok(None);
        };
        let Some(rhs) = self.to_numeric(rhs, &spelling)? else {
            return Ok(None);
        };

        if is_real(&lhs) || is_real(&rhs) {
            let lhs = self.promote_to_real(lhs)?;
            let rhs = self.promote_to_real(rhs)?;
            let value: BasicValueEnum = match op {
                BinOp::Add => self.builder.build_float_add(lhs, rhs, "addtmp")?.into(),
                BinOp::Sub => self.builder.build_float_sub(lhs, rhs, "subtmp")?.into(),
                BinOp::Mul => self.builder.build_float_mul(lhs, rhs, "multmp")?.into(),
                BinOp::Eq => self.float_cmp(FloatPredicate::OEQ, lhs, rhs, "eqtmp")?,
                BinOp::Ne => self.float_cmp(FloatPredicate::ONE, lhs, rhs, "netmp")?,
                BinOp::Lt => self.float_cmp(FloatPredicate::OLT, lhs, rhs, "lttmp")?,
                BinOp::Gt => self.float_cmp(FloatPredicate::OGT, lhs, rhs, "gttmp")?,
                BinOp::Le => self.float_cmp(FloatPredicate::OLE, lhs, rhs, "letmp")?,
                BinOp::Ge => self.float_cmp(FloatPredicate::OGE, lhs, rhs, "getmp")?,
                BinOp::Div | BinOp::IntDiv | BinOp::Mod | BinOp::And | BinOp::Or => {
                    unreachable!("handled above")
                },
            };
            Ok(Some(value))
        } else {
            let lhs = lhs.into_int_value();
            let rhs = rhs.into_int_value();
            let value: BasicValueEnum = match op {
                BinOp::Add => self.builder.build_int_add(lhs, rhs, "addtmp")?.into(),
                BinOp::Sub => self.builder.build_int_sub(lhs, rhs, "subtmp")?.into(),
                BinOp::Mul => self.builder.build_int_mul(lhs, rhs, "multmp")?.into(),
                BinOp::Eq => self.int_cmp(IntPredicate::EQ, lhs, rhs, "eqtmp")?,
                BinOp::Ne => self.int_cmp(IntPredicate::NE, lhs, rhs, "netmp")?,
                BinOp::Lt => self.int_cmp(IntPredicate::SLT, lhs, rhs, "lttmp")?,
                BinOp::Gt => self.int_cmp(IntPredicate::SGT, lhs, rhs, "gttmp")?,
                BinOp::Le => self.int_cmp(IntPredicate::SLE, lhs, rhs, "letmp")?,
                BinOp::Ge => self.int_cmp(IntPredicate::SGE, lhs, rhs, "getmp")?,
                BinOp::Div | BinOp::IntDiv | BinOp::Mod | BinOp::And | BinOp::Or => {
                    unreachable!("handled above")
                },
            };
            Ok(Some(value))
        }
    }

    /// Lowers a unary expression.
    ///
    /// `NOT` reduces to boolean and inverts; `-` negates in the operand's
    /// numeric type.
    pub(crate) fn emit_unary(
        &mut self,
        op: UnOp,
        operand: &Expr,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let Some(value) = self.emit_expr(operand)? else {
            return Ok(None);
        };

        match op {
            UnOp::Not => {
                let Some(value) = self.to_bool(value)? else {
                    return Ok(None);
                };
                Ok(Some(self.builder.build_not(value, "nottmp")?.into()))
            },
            UnOp::Neg => {
                if is_real(&value) {
                    let negated = self.builder.build_float_neg(value.into_float_value(), "negtmp")?;
                    Ok(Some(negated.into()))
                } else {
                    let Some(value) = self.to_numeric(value, "-")? else {
                        return Ok(None);
                    };
                    let negated = self.builder.build_int_neg(value.into_int_value(), "negtmp")?;
                    Ok(Some(negated.into()))
                }
            },
        }
    }

    /// Reduces a value to an i1.
    ///
    /// Integers test against zero, reals against 0.0; strings have no truth
    /// value and are reported.
    pub(crate) fn to_bool(&mut self, value: BasicValueEnum<'ctx>) -> Result<Option<IntValue<'ctx>>> {
        if is_bool(&value) {
            return Ok(Some(value.into_int_value()));
        }
        if is_int(&value) {
            let result = self.builder.build_int_compare(
                IntPredicate::NE,
                value.into_int_value(),
                self.context.i64_type().const_zero(),
                "tobool",
            )?;
            return Ok(Some(result));
        }
        if is_real(&value) {
            let result = self.builder.build_float_compare(
                FloatPredicate::ONE,
                value.into_float_value(),
                self.context.f64_type().const_zero(),
                "tobool",
            )?;
            return Ok(Some(result));
        }
        self.handler.error("a STRING value cannot be used as a condition");
        Ok(None)
    }

    /// Admits a value into numeric context: i64 and double pass, booleans
    /// widen to i64, strings are rejected.
    fn to_numeric(
        &mut self,
        value: BasicValueEnum<'ctx>,
        op: &str,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        if is_int(&value) || is_real(&value) {
            return Ok(Some(value));
        }
        if is_bool(&value) {
            let widened = self.builder.build_int_z_extend(
                value.into_int_value(),
                self.context.i64_type(),
                "booltoint",
            )?;
            return Ok(Some(widened.into()));
        }
        self.handler
            .error(format!("invalid STRING operand for `{}`", op));
        Ok(None)
    }

    /// Promotes a numeric value to double.
    fn promote_to_real(&mut self, value: BasicValueEnum<'ctx>) -> Result<FloatValue<'ctx>> {
        if is_real(&value) {
            return Ok(value.into_float_value());
        }
        Ok(self.builder.build_signed_int_to_float(
            value.into_int_value(),
            self.context.f64_type(),
            "inttoreal",
        )?)
    }

    fn float_cmp(
        &mut self,
        predicate: FloatPredicate,
        lhs: FloatValue<'ctx>,
        rhs: FloatValue<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        Ok(self
            .builder
            .build_float_compare(predicate, lhs, rhs, name)?
            .into())
    }

    fn int_cmp(
        &mut self,
        predicate: IntPredicate,
        lhs: IntValue<'ctx>,
        rhs: IntValue<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>> {
        Ok(self
            .builder
            .build_int_compare(predicate, lhs, rhs, name)?
            .into())
    }
}
