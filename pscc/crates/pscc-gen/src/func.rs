//! Function and procedure lowering: prototypes, definitions, calls, return.
//!
//! Emission is two-pass: `compile` registers every top-level prototype
//! before bodies or main statements are lowered, so a call to a function
//! defined further down still sees its real signature. A call to a name
//! with no prototype at all falls back to an inferred extern taking the
//! argument types as given and returning an integer.

use inkwell::module::Linkage;
use inkwell::types::{BasicMetadataTypeEnum, BasicType};
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue};
use inkwell::AddressSpace;

use pscc_par::{Expr, FunctionDef, Prototype, TypeTag};

use crate::error::Result;
use crate::scope::Slot;
use crate::CodeGen;

impl<'ctx> CodeGen<'ctx> {
    /// Registers a prototype: external function, BYREF params as pointers.
    ///
    /// Redefinition (a second prototype for the same name, or a collision
    /// with a runtime function) is reported and ignored.
    pub(crate) fn declare_proto(&mut self, proto: &Prototype) {
        if self.protos.contains_key(&proto.name) || self.module.get_function(&proto.name).is_some()
        {
            self.handler
                .error(format!("`{}` cannot be redefined", proto.name));
            return;
        }

        let param_types: Vec<BasicMetadataTypeEnum> = proto
            .params
            .iter()
            .map(|param| {
                let ty = self.basic_type(param.ty);
                if param.by_ref {
                    ty.ptr_type(AddressSpace::default()).into()
                } else {
                    ty.into()
                }
            })
            .collect();

        let fn_type = match proto.ret {
            TypeTag::Void => self.context.void_type().fn_type(&param_types, false),
            ret => self.basic_type(ret).fn_type(&param_types, false),
        };

        self.module
            .add_function(&proto.name, fn_type, Some(Linkage::External));
        self.protos.insert(proto.name.clone(), proto.clone());
    }

    /// Emits a definition body into its function.
    ///
    /// Saves the surrounding insertion point and symbol table, installs a
    /// fresh scope, binds parameters (BYVAL into fresh slots, BYREF as the
    /// incoming pointer), lowers the body, and closes with a default
    /// return when the last block is open.
    pub(crate) fn emit_function_def(&mut self, def: &FunctionDef) -> Result<()> {
        let proto = &def.proto;
        let Some(function) = self.module.get_function(&proto.name) else {
            // Prototype registration failed; the body has nowhere to go.
            return Ok(());
        };

        if function.count_basic_blocks() > 0 {
            self.handler
                .error(format!("`{}` cannot be redefined", proto.name));
            return Ok(());
        }

        let saved_block = self.builder.get_insert_block();
        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let saved_symbols = self.symbols.enter_function();
        let saved_ret = self.current_ret.replace(proto.ret);

        for (index, param) in proto.params.iter().enumerate() {
            let Some(arg) = function.get_nth_param(index as u32) else {
                break;
            };

            if param.by_ref {
                self.symbols.define(
                    param.name.as_str(),
                    Slot::Ref {
                        ptr: arg.into_pointer_value(),
                        ty: param.ty,
                    },
                );
            } else {
                let ptr = self.entry_alloca(self.basic_type(param.ty), &param.name)?;
                self.builder.build_store(ptr, arg)?;
                self.symbols.define(
                    param.name.as_str(),
                    Slot::Scalar { ptr, ty: param.ty },
                );
            }
        }

        for stmt in &def.body {
            self.emit_stmt(stmt)?;
        }

        if !self.block_terminated() {
            if proto.ret == TypeTag::Void {
                self.builder.build_return(None)?;
            } else {
                let zero = self.zero_value(proto.ret)?;
                self.builder.build_return(Some(&zero))?;
            }
        }

        self.current_ret = saved_ret;
        self.symbols.exit_function(saved_symbols);
        if let Some(block) = saved_block {
            self.builder.position_at_end(block);
        }
        Ok(())
    }

    /// Shared call-site lowering for call expressions and CALL statements.
    ///
    /// Returns the produced value, or `None` for void callees and reported
    /// errors.
    pub(crate) fn emit_call(
        &mut self,
        callee: &str,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        if self.is_string_intrinsic(callee) {
            return self.emit_string_intrinsic(callee, args);
        }

        if let Some(proto) = self.protos.get(callee).cloned() {
            return self.emit_known_call(callee, &proto, args);
        }

        if let Some(function) = self.module.get_function(callee) {
            // A runtime extern; all arguments by value, as typed.
            return self.emit_inferred_call(function, args);
        }

        // Call to an undeclared name: forward extern with inferred argument
        // types, returning an integer.
        let Some(values) = self.lower_byval_args(args)? else {
            return Ok(None);
        };
        let arg_types: Vec<BasicMetadataTypeEnum> =
            values.iter().map(|value| value.get_type().into()).collect();
        let fn_type = self.context.i64_type().fn_type(&arg_types, false);
        let function = self
            .module
            .add_function(callee, fn_type, Some(Linkage::External));
        let lowered: Vec<BasicMetadataValueEnum> = values.into_iter().map(Into::into).collect();
        let call = self.builder.build_call(function, &lowered, "calltmp")?;
        Ok(call.try_as_basic_value().basic())
    }

    /// Call to a declared FUNCTION/PROCEDURE: the signature drives byref
    /// argument handling and arity checking.
    fn emit_known_call(
        &mut self,
        callee: &str,
        proto: &Prototype,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        if args.len() != proto.params.len() {
            self.handler.error(format!(
                "`{}` expects {} argument(s) but {} were passed",
                callee,
                proto.params.len(),
                args.len()
            ));
            return Ok(None);
        }

        let mut lowered: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for (arg, param) in args.iter().zip(&proto.params) {
            if param.by_ref {
                let Expr::Var(var_name) = arg else {
                    self.handler.error(format!(
                        "BYREF argument `{}` of `{}` must be a plain variable",
                        param.name, callee
                    ));
                    return Ok(None);
                };
                let Some(slot) = self.symbols.resolve(var_name).cloned() else {
                    self.handler
                        .error(format!("unknown variable `{}`", var_name));
                    return Ok(None);
                };
                match slot {
                    Slot::Scalar { ptr, ty } | Slot::Ref { ptr, ty } => {
                        if ty != param.ty {
                            self.handler.error(format!(
                                "BYREF argument `{}` is {} but `{}` expects {}",
                                var_name, ty, callee, param.ty
                            ));
                            return Ok(None);
                        }
                        lowered.push(ptr.into());
                    },
                    Slot::Array { .. } => {
                        self.handler.error(format!(
                            "array `{}` cannot be passed BYREF to `{}`",
                            var_name, callee
                        ));
                        return Ok(None);
                    },
                }
            } else {
                let Some(value) = self.emit_expr(arg)? else {
                    return Ok(None);
                };
                let Some(value) = self.coerce_to(value, param.ty, &param.name)? else {
                    return Ok(None);
                };
                lowered.push(value.into());
            }
        }

        let function = self
            .module
            .get_function(callee)
            .ok_or(crate::error::CodeGenError::Internal("prototype without function"))?;
        let name = if proto.ret == TypeTag::Void { "" } else { "calltmp" };
        let call = self.builder.build_call(function, &lowered, name)?;
        Ok(call.try_as_basic_value().basic())
    }

    /// Call to an already-declared extern with no pseudocode signature.
    fn emit_inferred_call(
        &mut self,
        function: FunctionValue<'ctx>,
        args: &[Expr],
    ) -> Result<Option<BasicValueEnum<'ctx>>> {
        let fn_type = function.get_type();
        if !fn_type.is_var_arg() && fn_type.count_param_types() as usize != args.len() {
            self.handler.error(format!(
                "incorrect number of arguments passed to `{}`",
                function.get_name().to_string_lossy()
            ));
            return Ok(None);
        }

        let Some(values) = self.lower_byval_args(args)? else {
            return Ok(None);
        };
        let lowered: Vec<BasicMetadataValueEnum> = values.into_iter().map(Into::into).collect();
        let name = if fn_type.get_return_type().is_some() {
            "calltmp"
        } else {
            ""
        };
        let call = self.builder.build_call(function, &lowered, name)?;
        Ok(call.try_as_basic_value().basic())
    }

    /// Lowers an argument list with no signature to guide it.
    fn lower_byval_args(&mut self, args: &[Expr]) -> Result<Option<Vec<BasicValueEnum<'ctx>>>> {
        let mut lowered = Vec::with_capacity(args.len());
        for arg in args {
            let Some(value) = self.emit_expr(arg)? else {
                return Ok(None);
            };
            lowered.push(value);
        }
        Ok(Some(lowered))
    }

    /// `RETURN [expr]`
    ///
    /// In a function the value is coerced to the declared return type and a
    /// bare RETURN yields the zero value; in a procedure a value is an
    /// error; at top level RETURN ends `main` with exit code 0.
    pub(crate) fn emit_return(&mut self, value: Option<&Expr>) -> Result<()> {
        match self.current_ret {
            None => {
                if value.is_some() {
                    self.handler
                        .error("RETURN with a value is only allowed inside a FUNCTION");
                }
                self.builder
                    .build_return(Some(&self.context.i32_type().const_zero()))?;
            },
            Some(TypeTag::Void) => {
                if value.is_some() {
                    self.handler.error("a PROCEDURE cannot RETURN a value");
                }
                self.builder.build_return(None)?;
            },
            Some(ret) => match value {
                Some(expr) => {
                    let Some(value) = self.emit_expr(expr)? else {
                        return Ok(());
                    };
                    let Some(value) = self.coerce_to(value, ret, "RETURN value")? else {
                        return Ok(());
                    };
                    self.builder.build_return(Some(&value))?;
                },
                None => {
                    let zero = self.zero_value(ret)?;
                    self.builder.build_return(Some(&zero))?;
                },
            },
        }
        Ok(())
    }
}
