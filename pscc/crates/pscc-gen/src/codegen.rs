//! Core code generator: AST walk, scope management, and control flow.
//!
//! One `CodeGen` owns the LLVM module, the builder (the single mutable
//! insertion-point cursor), and the symbol table. The specialized emitters
//! in the sibling modules (`arith`, `array`, `func`, `runtime`, `strings`,
//! `types`) are implemented on the same struct, so everything shares the
//! one cursor and the one table.
//!
//! # Lowering shapes
//!
//! ```text
//! IF      cond -> then / else -> merge
//! WHILE   -> cond -> loop -> cond | after
//! REPEAT  -> loop -> cond -> loop | after     (UNTIL true exits)
//! FOR     -> cond -> loop -> inc -> cond | after
//! ```
//!
//! Blocks that already end in a terminator are never appended to; statements
//! following a RETURN in the same block are dropped.

use std::collections::HashMap;

use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, FunctionValue, IntValue, PointerValue};
use inkwell::basic_block::BasicBlock;

use pscc_par::{BinOp, Expr, Prototype, Stmt, TypeTag};
use pscc_util::Handler;

use crate::error::{CodeGenError, Result};
use crate::scope::{Slot, SymbolTable};

/// Returns true if the value is a 64-bit integer.
pub(crate) fn is_int(value: &BasicValueEnum) -> bool {
    value.is_int_value() && value.into_int_value().get_type().get_bit_width() == 64
}

/// Returns true if the value is a 1-bit boolean.
pub(crate) fn is_bool(value: &BasicValueEnum) -> bool {
    value.is_int_value() && value.into_int_value().get_type().get_bit_width() == 1
}

/// Returns true if the value is a double.
pub(crate) fn is_real(value: &BasicValueEnum) -> bool {
    value.is_float_value()
}

/// Returns true if the value is a string (byte pointer).
pub(crate) fn is_string(value: &BasicValueEnum) -> bool {
    value.is_pointer_value()
}

/// LLVM IR generator for one compilation session.
pub struct CodeGen<'ctx> {
    pub(crate) context: &'ctx Context,
    pub module: Module<'ctx>,
    pub(crate) builder: Builder<'ctx>,
    pub(crate) handler: &'ctx Handler,

    /// Name → storage slot, scoped per function.
    pub(crate) symbols: SymbolTable<'ctx>,

    /// Interned C string globals, keyed by contents.
    pub(crate) cstrings: HashMap<String, PointerValue<'ctx>>,

    /// Source-level signatures of declared FUNCTIONs/PROCEDUREs.
    pub(crate) protos: HashMap<String, Prototype>,

    /// Return type of the function currently being emitted; `None` in main.
    pub(crate) current_ret: Option<TypeTag>,
}

impl<'ctx> CodeGen<'ctx> {
    /// Creates a generator with an empty module.
    pub fn new(context: &'ctx Context, module_name: &str, handler: &'ctx Handler) -> Self {
        Self {
            context,
            module: context.create_module(module_name),
            builder: context.create_builder(),
            handler,
            symbols: SymbolTable::new(),
            cstrings: HashMap::new(),
            protos: HashMap::new(),
            current_ret: None,
        }
    }

    /// Compiles a program into the module.
    ///
    /// Two passes: first every FUNCTION/PROCEDURE prototype is registered,
    /// so forward calls see real signatures; then `main` is created and the
    /// statement list is lowered in order, with definitions switching the
    /// cursor into their own function and back.
    pub fn compile(&mut self, program: &[Stmt]) -> Result<()> {
        self.declare_runtime();

        for stmt in program {
            if let Stmt::FunctionDef(def) = stmt {
                self.declare_proto(&def.proto);
            }
        }

        let i32_type = self.context.i32_type();
        let main_type = i32_type.fn_type(&[], false);
        let main_fn = self.module.add_function("main", main_type, None);
        let entry = self.context.append_basic_block(main_fn, "entry");
        self.builder.position_at_end(entry);

        for stmt in program {
            self.emit_stmt(stmt)?;
        }

        if !self.block_terminated() {
            self.builder.build_return(Some(&i32_type.const_zero()))?;
        }

        Ok(())
    }

    /// Lowers one statement at the current insertion point.
    pub fn emit_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        if self.block_terminated() && !matches!(stmt, Stmt::FunctionDef(_)) {
            // Unreachable statement after RETURN; drop it.
            return Ok(());
        }

        match stmt {
            Stmt::Declare { name, ty } => self.declare_scalar(name, *ty),
            Stmt::DeclareArray { name, elem, bounds } => {
                self.emit_array_declare(name, *elem, bounds)
            },
            Stmt::Assign { name, value } => self.emit_assign(name, value),
            Stmt::AssignArray {
                name,
                indices,
                value,
                line,
            } => self.emit_array_assign(name, indices, value, *line),
            Stmt::Input(name) => self.emit_input(name),
            Stmt::Output(expr) => self.emit_output(expr),
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => self.emit_if(cond, then_body, else_body),
            Stmt::While { cond, body } => self.emit_while(cond, body),
            Stmt::Repeat { body, until } => self.emit_repeat(body, until),
            Stmt::For {
                var,
                start,
                end,
                step,
                body,
            } => self.emit_for(var, start, end, step.as_ref(), body),
            Stmt::FunctionDef(def) => self.emit_function_def(def),
            Stmt::Call { callee, args } => {
                self.emit_call(callee, args)?;
                Ok(())
            },
            Stmt::Return(value) => self.emit_return(value.as_ref()),
        }
    }

    /// Lowers one expression to an SSA value.
    ///
    /// `Ok(None)` means a semantic error was reported and the construct
    /// should be dropped by the caller.
    pub fn emit_expr(&mut self, expr: &Expr) -> Result<Option<BasicValueEnum<'ctx>>> {
        match expr {
            Expr::Int(value) => Ok(Some(self.const_int(*value).into())),
            Expr::Real(value) => Ok(Some(self.const_real(*value).into())),
            Expr::Bool(value) => Ok(Some(self.const_bool(*value).into())),
            Expr::Var(name) => self.emit_var_load(name),
            Expr::ArrayAccess {
                name,
                indices,
                line,
            } => self.emit_array_access(name, indices, *line),
            Expr::Unary { op, operand } => self.emit_unary(*op, operand),
            Expr::Binary { op, lhs, rhs, line } => self.emit_binary_expr(*op, lhs, rhs, *line),
            Expr::Call { callee, args } => {
                let result = self.emit_call(callee, args)?;
                if result.is_none() {
                    // Reported already for semantic failures; a void callee
                    // in value position gets its own message.
                    if self.protos.get(callee).map(|p| p.ret) == Some(TypeTag::Void) {
                        self.handler.error(format!(
                            "procedure `{}` does not return a value",
                            callee
                        ));
                    }
                }
                Ok(result)
            },
        }
    }

    /// Loads a scalar variable.
    fn emit_var_load(&mut self, name: &str) -> Result<Option<BasicValueEnum<'ctx>>> {
        let Some(slot) = self.symbols.resolve(name).cloned() else {
            self.handler.error(format!("unknown variable `{}`", name));
            return Ok(None);
        };

        match slot {
            Slot::Scalar { ptr, ty: _ } | Slot::Ref { ptr, ty: _ } => {
                let loaded = self.builder.build_load(ptr, name)?;
                Ok(Some(loaded))
            },
            Slot::Array { .. } => {
                self.handler
                    .error(format!("array `{}` cannot be used without indices here", name));
                Ok(None)
            },
        }
    }

    /// `name <- value`
    fn emit_assign(&mut self, name: &str, value: &Expr) -> Result<()> {
        let Some(value) = self.emit_expr(value)? else {
            return Ok(());
        };
        let Some(slot) = self.symbols.resolve(name).cloned() else {
            self.handler.error(format!("unknown variable `{}`", name));
            return Ok(());
        };

        match slot {
            Slot::Scalar { ptr, ty } | Slot::Ref { ptr, ty } => {
                if let Some(value) = self.coerce_to(value, ty, name)? {
                    self.builder.build_store(ptr, value)?;
                }
            },
            Slot::Array { .. } => {
                self.handler.error(format!(
                    "cannot assign to array `{}` without indices",
                    name
                ));
            },
        }
        Ok(())
    }

    /// `INPUT name`
    ///
    /// Integers read with `%lld`, reals with `%lf`; booleans go through an
    /// integer temporary and a zero test.
    fn emit_input(&mut self, name: &str) -> Result<()> {
        let Some(slot) = self.symbols.resolve(name).cloned() else {
            self.handler.error(format!("unknown variable `{}`", name));
            return Ok(());
        };

        let (ptr, ty) = match slot {
            Slot::Scalar { ptr, ty } | Slot::Ref { ptr, ty } => (ptr, ty),
            Slot::Array { .. } => {
                self.handler
                    .error(format!("INPUT into array `{}` is not supported", name));
                return Ok(());
            },
        };

        let scanf = self.scanf_fn();
        match ty {
            TypeTag::Integer => {
                let fmt = self.cstring("%lld", "fmt_in")?;
                self.builder
                    .build_call(scanf, &[fmt.into(), ptr.into()], "")?;
            },
            TypeTag::Real => {
                let fmt = self.cstring("%lf", "fmt_in_real")?;
                self.builder
                    .build_call(scanf, &[fmt.into(), ptr.into()], "")?;
            },
            TypeTag::Boolean => {
                let i64_type = self.context.i64_type();
                let tmp = self.entry_alloca(i64_type.into(), "input_tmp")?;
                let fmt = self.cstring("%lld", "fmt_in")?;
                self.builder
                    .build_call(scanf, &[fmt.into(), tmp.into()], "")?;
                let raw = self
                    .builder
                    .build_load(tmp, "input_raw")?
                    .into_int_value();
                let as_bool = self.builder.build_int_compare(
                    inkwell::IntPredicate::NE,
                    raw,
                    i64_type.const_zero(),
                    "input_bool",
                )?;
                self.builder.build_store(ptr, as_bool)?;
            },
            TypeTag::String | TypeTag::Void => {
                self.handler
                    .error(format!("INPUT into `{}` is not supported for its type", name));
            },
        }
        Ok(())
    }

    /// `OUTPUT expr`
    ///
    /// Array operands (bare or partially indexed) are handed to the array
    /// printer first; everything else prints one value by type.
    fn emit_output(&mut self, expr: &Expr) -> Result<()> {
        if self.try_array_output(expr)? {
            return Ok(());
        }

        let Some(value) = self.emit_expr(expr)? else {
            return Ok(());
        };
        self.emit_output_value(value)
    }

    /// Prints one scalar value with the format its type calls for.
    pub(crate) fn emit_output_value(&mut self, value: BasicValueEnum<'ctx>) -> Result<()> {
        let printf = self.printf_fn();

        if is_real(&value) {
            let fmt = self.cstring("%f\n", "fmt_real_nl")?;
            self.builder
                .build_call(printf, &[fmt.into(), value.into()], "")?;
        } else if is_bool(&value) {
            let yes = self.cstring("TRUE", "str_true")?;
            let no = self.cstring("FALSE", "str_false")?;
            let chosen =
                self.builder
                    .build_select(value.into_int_value(), yes, no, "bool_str")?;
            let fmt = self.cstring("%s\n", "fmt_str_nl")?;
            self.builder
                .build_call(printf, &[fmt.into(), chosen.into()], "")?;
        } else if is_string(&value) {
            let fmt = self.cstring("%s\n", "fmt_str_nl")?;
            self.builder
                .build_call(printf, &[fmt.into(), value.into()], "")?;
        } else {
            let fmt = self.cstring("%lld\n", "fmt_nl")?;
            self.builder
                .build_call(printf, &[fmt.into(), value.into()], "")?;
        }
        Ok(())
    }

    /// `IF cond THEN ... ELSE ... ENDIF`
    fn emit_if(&mut self, cond: &Expr, then_body: &[Stmt], else_body: &[Stmt]) -> Result<()> {
        let Some(cond) = self.emit_condition(cond)? else {
            return Ok(());
        };

        let function = self.current_function()?;
        let then_bb = self.context.append_basic_block(function, "then");
        let else_bb = self.context.append_basic_block(function, "else");
        let merge_bb = self.context.append_basic_block(function, "ifcont");

        self.builder.build_conditional_branch(cond, then_bb, else_bb)?;

        self.builder.position_at_end(then_bb);
        for stmt in then_body {
            self.emit_stmt(stmt)?;
        }
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(merge_bb)?;
        }

        self.builder.position_at_end(else_bb);
        for stmt in else_body {
            self.emit_stmt(stmt)?;
        }
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(merge_bb)?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }

    /// `WHILE cond DO ... ENDWHILE`
    fn emit_while(&mut self, cond: &Expr, body: &[Stmt]) -> Result<()> {
        let function = self.current_function()?;
        let cond_bb = self.context.append_basic_block(function, "whilecond");
        let loop_bb = self.context.append_basic_block(function, "whileloop");
        let after_bb = self.context.append_basic_block(function, "whilecont");

        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(cond_bb);
        match self.emit_condition(cond)? {
            Some(cond) => {
                self.builder
                    .build_conditional_branch(cond, loop_bb, after_bb)?;
            },
            // Broken condition: keep the CFG well formed and move on.
            None => {
                self.builder.build_unconditional_branch(after_bb)?;
            },
        }

        self.builder.position_at_end(loop_bb);
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(cond_bb)?;
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// `REPEAT ... UNTIL cond` - post-test, the condition being true exits.
    fn emit_repeat(&mut self, body: &[Stmt], until: &Expr) -> Result<()> {
        let function = self.current_function()?;
        let loop_bb = self.context.append_basic_block(function, "repeatloop");
        let cond_bb = self.context.append_basic_block(function, "repeatcond");
        let after_bb = self.context.append_basic_block(function, "repeatcont");

        self.builder.build_unconditional_branch(loop_bb)?;

        self.builder.position_at_end(loop_bb);
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(cond_bb)?;
        }

        self.builder.position_at_end(cond_bb);
        match self.emit_condition(until)? {
            Some(cond) => {
                self.builder
                    .build_conditional_branch(cond, after_bb, loop_bb)?;
            },
            None => {
                self.builder.build_unconditional_branch(after_bb)?;
            },
        }

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// `FOR var <- start TO end [STEP step] ... NEXT var`
    ///
    /// The exit comparison is `<=` unless the step is a compile-time
    /// negative integer literal, in which case it is `>=`. A dynamically
    /// negative step keeps the `<=` sense.
    fn emit_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<()> {
        let Some(start) = self.emit_expr(start)? else {
            return Ok(());
        };

        let Some(slot) = self.symbols.resolve(var).cloned() else {
            self.handler
                .error(format!("unknown FOR loop variable `{}`", var));
            return Ok(());
        };
        let (var_ptr, var_ty) = match slot {
            Slot::Scalar { ptr, ty } | Slot::Ref { ptr, ty } => (ptr, ty),
            Slot::Array { .. } => {
                self.handler
                    .error(format!("array `{}` cannot be a FOR loop variable", var));
                return Ok(());
            },
        };

        let Some(start) = self.coerce_to(start, var_ty, var)? else {
            return Ok(());
        };
        self.builder.build_store(var_ptr, start)?;

        let function = self.current_function()?;
        let cond_bb = self.context.append_basic_block(function, "forcond");
        let loop_bb = self.context.append_basic_block(function, "forloop");
        let inc_bb = self.context.append_basic_block(function, "forinc");
        let after_bb = self.context.append_basic_block(function, "forcont");

        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(cond_bb);
        let current: BasicValueEnum =
            self.builder
                .build_load(var_ptr, var)?;
        let cmp_op = if step.map_or(false, is_negative_int_literal) {
            BinOp::Ge
        } else {
            BinOp::Le
        };
        match self.emit_expr(end)? {
            Some(end) => match self.emit_binary_op(cmp_op, current, end, 0)? {
                Some(cond) => {
                    let cond = cond.into_int_value();
                    self.builder
                        .build_conditional_branch(cond, loop_bb, after_bb)?;
                },
                None => {
                    self.builder.build_unconditional_branch(after_bb)?;
                },
            },
            None => {
                self.builder.build_unconditional_branch(after_bb)?;
            },
        }

        self.builder.position_at_end(loop_bb);
        for stmt in body {
            self.emit_stmt(stmt)?;
        }
        if !self.block_terminated() {
            self.builder.build_unconditional_branch(inc_bb)?;
        }

        self.builder.position_at_end(inc_bb);
        let step_value = match step {
            Some(step) => self.emit_expr(step)?,
            None => Some(self.const_int(1).into()),
        };
        let step_value = step_value.unwrap_or_else(|| self.const_int(1).into());
        let current: BasicValueEnum =
            self.builder
                .build_load(var_ptr, var)?;
        if let Some(next) = self.emit_binary_op(BinOp::Add, current, step_value, 0)? {
            if let Some(next) = self.coerce_to(next, var_ty, var)? {
                self.builder.build_store(var_ptr, next)?;
            }
        }
        self.builder.build_unconditional_branch(cond_bb)?;

        self.builder.position_at_end(after_bb);
        Ok(())
    }

    /// Evaluates an expression and reduces it to an i1.
    pub(crate) fn emit_condition(&mut self, expr: &Expr) -> Result<Option<IntValue<'ctx>>> {
        let Some(value) = self.emit_expr(expr)? else {
            return Ok(None);
        };
        self.to_bool(value)
    }

    /// Coerces a value toward a slot's type before a store.
    ///
    /// Integer widens to real; boolean zero-extends into an integer slot or
    /// promotes on through to real; an integer stored into a boolean slot
    /// becomes a zero test; a real stored into an integer slot truncates
    /// toward zero (`x <- 10 / 4` leaves 2 in an INTEGER slot, since `/`
    /// always produces a real). Anything else that does not already match
    /// is a reported type error.
    pub(crate) fn coerce_to(
        &mut self,
        value: BasicValueEnum<'ctx>,
        target: TypeTag,
        what: &str,
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let i64_type = self.context.i64_type();
        let f64_type = self.context.f64_type();

        let coerced = match target {
            TypeTag::Integer => {
                if is_int(&value) {
                    Some(value)
                } else if is_bool(&value) {
                    Some(
                        self.builder
                            .build_int_z_extend(value.into_int_value(), i64_type, "booltoint")?
                            .into(),
                    )
                } else if is_real(&value) {
                    Some(
                        self.builder
                            .build_float_to_signed_int(
                                value.into_float_value(),
                                i64_type,
                                "realtoint",
                            )?
                            .into(),
                    )
                } else {
                    None
                }
            },
            TypeTag::Real => {
                if is_real(&value) {
                    Some(value)
                } else if is_int(&value) {
                    Some(
                        self.builder
                            .build_signed_int_to_float(
                                value.into_int_value(),
                                f64_type,
                                "inttoreal",
                            )?
                            .into(),
                    )
                } else if is_bool(&value) {
                    let wide = self.builder.build_int_z_extend(
                        value.into_int_value(),
                        i64_type,
                        "booltoint",
                    )?;
                    Some(
                        self.builder
                            .build_signed_int_to_float(wide, f64_type, "inttoreal")?
                            .into(),
                    )
                } else {
                    None
                }
            },
            TypeTag::Boolean => {
                if is_bool(&value) {
                    Some(value)
                } else if is_int(&value) {
                    Some(
                        self.builder
                            .build_int_compare(
                                inkwell::IntPredicate::NE,
                                value.into_int_value(),
                                i64_type.const_zero(),
                                "tobool",
                            )?
                            .into(),
                    )
                } else {
                    None
                }
            },
            TypeTag::String => {
                if is_string(&value) {
                    Some(value)
                } else {
                    None
                }
            },
            TypeTag::Void => None,
        };

        if coerced.is_none() {
            self.handler.error(format!(
                "type mismatch: cannot store this value into `{}` ({})",
                what, target
            ));
        }
        Ok(coerced)
    }

    // =========================================================================
    // Builder plumbing
    // =========================================================================

    /// The function owning the current insertion point.
    pub(crate) fn current_function(&self) -> Result<FunctionValue<'ctx>> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or(CodeGenError::NoInsertPoint("statement"))
    }

    /// True when the current block already ends in a terminator (or there
    /// is no current block).
    pub(crate) fn block_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .map_or(true, |block| block.get_terminator().is_some())
    }

    /// Extracts the value a non-void call produced.
    pub(crate) fn call_value(
        &self,
        call: inkwell::values::CallSiteValue<'ctx>,
    ) -> Result<BasicValueEnum<'ctx>> {
        call.try_as_basic_value()
            .basic()
            .ok_or(CodeGenError::Internal("expected a value-producing call"))
    }

    /// Allocates a slot in the entry block of the current function, so it
    /// dominates every use.
    pub(crate) fn entry_alloca(
        &self,
        ty: BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<PointerValue<'ctx>> {
        let function = self.current_function()?;
        let entry: BasicBlock = function
            .get_first_basic_block()
            .ok_or(CodeGenError::NoInsertPoint("entry block"))?;

        let tmp = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(first) => tmp.position_before(&first),
            None => tmp.position_at_end(entry),
        }
        Ok(tmp.build_alloca(ty, name)?)
    }
}

/// True for `-k` and negative integer literals in STEP position.
///
/// The parser renders `STEP -1` as unary negation of `1`, so both shapes
/// must be recognized.
fn is_negative_int_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Int(value) => *value < 0,
        Expr::Unary {
            op: pscc_par::UnOp::Neg,
            operand,
        } => matches!(**operand, Expr::Int(value) if value >= 0),
        _ => false,
    }
}
