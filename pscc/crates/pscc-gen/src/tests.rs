//! End-to-end emission tests: source text in, verified IR text out.

use inkwell::context::Context;
use pscc_par::Parser;
use pscc_util::Handler;

use crate::CodeGen;

/// Compiles source that must be clean: no diagnostics, verifier happy.
fn compile(source: &str) -> String {
    let handler = Handler::new_quiet();
    let program = Parser::new(source, &handler).parse();
    assert!(
        !handler.has_errors(),
        "parse diagnostics: {:?}",
        handler.diagnostics()
    );

    let context = Context::create();
    let mut codegen = CodeGen::new(&context, "test_module", &handler);
    codegen.compile(&program).expect("emission failed");
    assert!(
        !handler.has_errors(),
        "codegen diagnostics: {:?}",
        handler.diagnostics()
    );

    let ir = codegen.module.print_to_string().to_string();
    if let Err(message) = codegen.module.verify() {
        panic!("verifier rejected module: {}\n{}", message.to_string(), ir);
    }
    ir
}

/// Compiles source expected to produce diagnostics, but still a module
/// that verifies.
fn compile_with_errors(source: &str) -> String {
    let handler = Handler::new_quiet();
    let program = Parser::new(source, &handler).parse();

    let context = Context::create();
    let mut codegen = CodeGen::new(&context, "test_module", &handler);
    codegen.compile(&program).expect("emission failed");
    assert!(handler.has_errors(), "expected diagnostics, got none");

    let ir = codegen.module.print_to_string().to_string();
    if let Err(message) = codegen.module.verify() {
        panic!("verifier rejected module: {}\n{}", message.to_string(), ir);
    }
    ir
}

#[test]
fn test_constant_arithmetic_folds_into_store() {
    let ir = compile("DECLARE x : INTEGER\nx <- 21 * 2\nOUTPUT x");
    assert!(ir.contains("define i32 @main"));
    assert!(ir.contains("i64 42"), "expected folded 42 in:\n{}", ir);
    assert!(ir.contains("@printf"));
    assert!(ir.contains("%lld"));
}

#[test]
fn test_declared_scalar_is_zero_initialized_in_entry() {
    let ir = compile("DECLARE x : INTEGER");
    assert!(ir.contains("%x = alloca i64"));
    assert!(ir.contains("store i64 0, i64* %x"));
}

#[test]
fn test_runtime_surface_is_always_declared() {
    let ir = compile("OUTPUT 1");
    for name in [
        "@printf", "@scanf", "@malloc", "@free", "@exit", "@strlen", "@memcpy", "@toupper",
        "@tolower",
    ] {
        assert!(ir.contains(name), "missing runtime extern {} in:\n{}", name, ir);
    }
}

#[test]
fn test_real_output_uses_float_format() {
    let ir = compile("DECLARE y : REAL\ny <- 2.5\nOUTPUT y");
    assert!(ir.contains("%f\\0A"), "expected %f format in:\n{}", ir);
    assert!(ir.contains("alloca double"));
}

#[test]
fn test_boolean_output_selects_literal() {
    let ir = compile("DECLARE b : BOOLEAN\nb <- TRUE\nOUTPUT b");
    assert!(ir.contains("TRUE"));
    assert!(ir.contains("FALSE"));
    assert!(ir.contains("select i1"));
    assert!(ir.contains("%s\\0A"));
}

#[test]
fn test_integer_division_by_variable_promotes_to_real() {
    let ir = compile("DECLARE x : INTEGER\nDECLARE y : REAL\nx <- 5\ny <- x / 2\nOUTPUT y");
    assert!(ir.contains("sitofp"), "expected promotion in:\n{}", ir);
    assert!(ir.contains("fdiv"), "expected real division in:\n{}", ir);
}

#[test]
fn test_slash_division_is_guarded() {
    let ir = compile("DECLARE x : INTEGER\nDECLARE y : REAL\nINPUT x\ny <- 10 / x\nOUTPUT y");
    assert!(ir.contains("Division by zero"));
    assert!(ir.contains("check_fail"));
    assert!(ir.contains("unreachable"));
}

#[test]
fn test_div_and_mod_are_guarded_integer_ops() {
    let ir = compile(
        "DECLARE a : INTEGER\nDECLARE b : INTEGER\nINPUT a\nINPUT b\n\
         OUTPUT a DIV b\nOUTPUT a MOD b",
    );
    assert!(ir.contains("sdiv"));
    assert!(ir.contains("srem"));
    assert!(ir.contains("Division by zero"));
}

#[test]
fn test_division_by_literal_zero_still_guards() {
    let ir = compile("DECLARE x : INTEGER\nx <- 10 / 0");
    assert!(ir.contains("Division by zero"));
    assert!(ir.contains("@exit"));
}

#[test]
fn test_div_requires_integer_operands() {
    compile_with_errors("DECLARE x : INTEGER\nx <- 1.5 DIV 2");
}

#[test]
fn test_comparisons_are_signed() {
    let ir = compile("DECLARE a : INTEGER\nINPUT a\nIF a < 0 THEN\nOUTPUT 1\nENDIF");
    assert!(ir.contains("icmp slt"));
}

#[test]
fn test_real_comparison_is_ordered() {
    let ir = compile("DECLARE y : REAL\nINPUT y\nIF y >= 1.5 THEN\nOUTPUT 1\nENDIF");
    assert!(ir.contains("fcmp oge"));
}

#[test]
fn test_if_blocks() {
    let ir = compile("DECLARE x : INTEGER\nIF x = 1 THEN\nOUTPUT 1\nELSE\nOUTPUT 2\nENDIF");
    assert!(ir.contains("then:"));
    assert!(ir.contains("else:"));
    assert!(ir.contains("ifcont:"));
}

#[test]
fn test_while_blocks() {
    let ir = compile("DECLARE i : INTEGER\nWHILE i < 3 DO\ni <- i + 1\nENDWHILE");
    assert!(ir.contains("whilecond:"));
    assert!(ir.contains("whileloop:"));
    assert!(ir.contains("whilecont:"));
}

#[test]
fn test_repeat_blocks_post_test() {
    let ir = compile("DECLARE i : INTEGER\nREPEAT\ni <- i + 1\nUNTIL i = 3");
    assert!(ir.contains("repeatloop:"));
    assert!(ir.contains("repeatcond:"));
    assert!(ir.contains("repeatcont:"));
    // Body comes before the condition block in the function layout.
    assert!(ir.find("repeatloop:").unwrap() < ir.find("repeatcond:").unwrap());
}

#[test]
fn test_for_ascending_uses_sle() {
    let ir = compile("DECLARE i : INTEGER\nFOR i <- 1 TO 3\nOUTPUT i\nNEXT i");
    assert!(ir.contains("forcond:"));
    assert!(ir.contains("forinc:"));
    assert!(ir.contains("icmp sle"), "expected <= sense in:\n{}", ir);
}

#[test]
fn test_for_negative_literal_step_uses_sge() {
    let ir = compile("DECLARE i : INTEGER\nFOR i <- 3 TO 1 STEP -1\nOUTPUT i\nNEXT i");
    assert!(ir.contains("icmp sge"), "expected >= sense in:\n{}", ir);
}

#[test]
fn test_for_dynamic_step_keeps_sle() {
    let ir = compile(
        "DECLARE i : INTEGER\nDECLARE s : INTEGER\nINPUT s\n\
         FOR i <- 1 TO 10 STEP s\nOUTPUT i\nNEXT i",
    );
    assert!(ir.contains("icmp sle"));
    assert!(!ir.contains("icmp sge"));
}

#[test]
fn test_array_allocation_size() {
    // 3 elements x 8 bytes.
    let ir = compile("DECLARE a : ARRAY[1:3] OF INTEGER\na[1] <- 10");
    assert!(ir.contains("@malloc(i64 24)"), "expected 24-byte malloc in:\n{}", ir);
}

#[test]
fn test_multi_dim_array_allocation_size() {
    // (3-1+1) x (9-0+1) = 30 elements x 8 bytes = 240.
    let ir = compile("DECLARE m : ARRAY[1:3, 0:9] OF INTEGER\nm[1, 0] <- 1");
    assert!(ir.contains("@malloc(i64 240)"), "expected 240-byte malloc in:\n{}", ir);
}

#[test]
fn test_boolean_array_uses_one_byte_elements() {
    let ir = compile("DECLARE flags : ARRAY[1:4] OF BOOLEAN\nflags[1] <- TRUE");
    assert!(ir.contains("@malloc(i64 4)"), "expected 4-byte malloc in:\n{}", ir);
    assert!(ir.contains("i1*"), "expected i1 element storage in:\n{}", ir);
}

#[test]
fn test_real_array_elements_are_doubles() {
    let ir = compile("DECLARE v : ARRAY[1:2] OF REAL\nv[1] <- 0.5\nOUTPUT v[1]");
    assert!(ir.contains("double*"), "expected double element storage in:\n{}", ir);
}

#[test]
fn test_array_access_is_bounds_checked_before_load() {
    let ir = compile("DECLARE a : ARRAY[1:3] OF INTEGER\nOUTPUT a[2]");
    assert!(ir.contains("Array index out of bounds"));
    let check = ir.find("out_of_bounds").expect("bounds check missing");
    let load = ir.find("%elem = load").expect("element load missing");
    assert!(check < load, "check must precede the element load:\n{}", ir);
}

#[test]
fn test_array_store_is_bounds_checked() {
    let ir = compile("DECLARE a : ARRAY[1:3] OF INTEGER\na[5] <- 1");
    assert!(ir.contains("Array index out of bounds"));
    assert!(ir.contains("check_fail"));
}

#[test]
fn test_whole_array_output_synthesizes_loop() {
    let ir = compile(
        "DECLARE a : ARRAY[1:3] OF INTEGER\na[1] <- 10\na[2] <- 20\na[3] <- 30\nOUTPUT a",
    );
    assert!(ir.contains("arr_loop"));
    assert!(ir.contains("arr_after"));
}

#[test]
fn test_partially_indexed_output_loops_tail_dimensions() {
    let ir = compile("DECLARE m : ARRAY[1:2, 1:3] OF INTEGER\nOUTPUT m[1]");
    assert!(ir.contains("arr_loop"));
}

#[test]
fn test_fully_indexed_output_is_plain_element_read() {
    let ir = compile("DECLARE m : ARRAY[1:2, 1:3] OF INTEGER\nOUTPUT m[1, 2]");
    assert!(!ir.contains("arr_loop"));
}

#[test]
fn test_input_formats_by_type() {
    let ir = compile(
        "DECLARE i : INTEGER\nDECLARE r : REAL\nDECLARE b : BOOLEAN\nINPUT i\nINPUT r\nINPUT b",
    );
    assert!(ir.contains("%lld"));
    assert!(ir.contains("%lf"));
    // Boolean input goes through an integer temporary and a zero test.
    assert!(ir.contains("input_tmp"));
    assert!(ir.contains("icmp ne"));
}

#[test]
fn test_function_definition_and_call() {
    let ir = compile(
        "FUNCTION double(n : INTEGER) RETURNS INTEGER\nRETURN n * 2\nENDFUNCTION\n\
         DECLARE x : INTEGER\nx <- double(21)\nOUTPUT x",
    );
    assert!(ir.contains("define i64 @double(i64"));
    assert!(ir.contains("call i64 @double"));
}

#[test]
fn test_procedure_byref_parameter_is_pointer() {
    let ir = compile(
        "PROCEDURE bump(BYREF n : INTEGER)\nn <- n + 1\nENDPROCEDURE\n\
         DECLARE x : INTEGER\nx <- 41\nCALL bump(x)\nOUTPUT x",
    );
    assert!(ir.contains("define void @bump(i64*"), "byref should be i64*:\n{}", ir);
    assert!(ir.contains("call void @bump(i64* %x"), "call should pass the slot:\n{}", ir);
}

#[test]
fn test_byval_parameter_gets_fresh_slot() {
    let ir = compile(
        "PROCEDURE show(n : INTEGER)\nOUTPUT n\nENDPROCEDURE\nCALL show(7)",
    );
    assert!(ir.contains("define void @show(i64"));
    assert!(ir.contains("%n = alloca i64"));
}

#[test]
fn test_function_without_return_gets_zero_default() {
    let ir = compile("FUNCTION f() RETURNS INTEGER\nENDFUNCTION\nOUTPUT f()");
    assert!(ir.contains("ret i64 0"));
}

#[test]
fn test_forward_call_sees_real_signature() {
    // g is called before its definition appears; two-pass prototype
    // registration means no inferred extern is created.
    let ir = compile(
        "DECLARE x : INTEGER\nx <- g(1)\nOUTPUT x\n\
         FUNCTION g(n : INTEGER) RETURNS INTEGER\nRETURN n + 1\nENDFUNCTION",
    );
    assert!(ir.contains("define i64 @g(i64"));
    assert!(!ir.contains("declare i64 @g"));
}

#[test]
fn test_call_to_undeclared_name_creates_extern() {
    let ir = compile("DECLARE x : INTEGER\nx <- mystery(1, 2)\nOUTPUT x");
    assert!(ir.contains("declare i64 @mystery(i64, i64)"));
}

#[test]
fn test_recursive_function() {
    let ir = compile(
        "FUNCTION fact(n : INTEGER) RETURNS INTEGER\n\
         IF n <= 1 THEN\nRETURN 1\nENDIF\n\
         RETURN n * fact(n - 1)\n\
         ENDFUNCTION\n\
         OUTPUT fact(5)",
    );
    assert!(ir.contains("call i64 @fact"));
}

#[test]
fn test_redefinition_is_reported() {
    compile_with_errors(
        "PROCEDURE p\nENDPROCEDURE\nPROCEDURE p\nENDPROCEDURE",
    );
}

#[test]
fn test_arity_mismatch_is_reported() {
    compile_with_errors(
        "PROCEDURE p(n : INTEGER)\nENDPROCEDURE\nCALL p(1, 2)",
    );
}

#[test]
fn test_byref_argument_must_be_variable() {
    compile_with_errors(
        "PROCEDURE p(BYREF n : INTEGER)\nENDPROCEDURE\nCALL p(1 + 2)",
    );
}

#[test]
fn test_undeclared_variable_is_reported() {
    compile_with_errors("x <- 1");
}

#[test]
fn test_statements_after_return_are_dropped() {
    let ir = compile(
        "FUNCTION f() RETURNS INTEGER\nRETURN 1\nOUTPUT 999\nENDFUNCTION\nOUTPUT f()",
    );
    assert!(!ir.contains("999"));
}

#[test]
fn test_string_declaration_defaults_empty() {
    let ir = compile("DECLARE s : STRING");
    assert!(ir.contains("%s = alloca i8*"));
}

#[test]
fn test_length_lowers_to_strlen() {
    let ir = compile("DECLARE s : STRING\nDECLARE n : INTEGER\nn <- LENGTH(s)\nOUTPUT n");
    assert!(ir.contains("call i64 @strlen"));
}

#[test]
fn test_mid_copies_and_terminates() {
    let ir = compile("DECLARE s : STRING\nDECLARE t : STRING\nt <- MID(s, 2, 3)\nOUTPUT t");
    assert!(ir.contains("@memcpy"));
    assert!(ir.contains("@malloc"));
}

#[test]
fn test_ucase_loops_through_toupper() {
    let ir = compile("DECLARE s : STRING\nDECLARE t : STRING\nt <- UCASE(s)\nOUTPUT t");
    assert!(ir.contains("@toupper"));
    assert!(ir.contains("case_loop"));
}

#[test]
fn test_lcase_uses_tolower() {
    let ir = compile("DECLARE s : STRING\ns <- LCASE(s)");
    assert!(ir.contains("@tolower"));
}

#[test]
fn test_reemission_is_deterministic() {
    let source = "DECLARE a : ARRAY[1:3] OF INTEGER\n\
                  DECLARE i : INTEGER\n\
                  FOR i <- 1 TO 3\na[i] <- i * i\nNEXT i\n\
                  OUTPUT a";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_boolean_condition_from_integer_is_zero_test() {
    let ir = compile("DECLARE x : INTEGER\nIF x THEN\nOUTPUT 1\nENDIF");
    assert!(ir.contains("icmp ne"));
}

#[test]
fn test_and_or_reduce_operands_to_i1() {
    let ir = compile(
        "DECLARE a : INTEGER\nDECLARE b : INTEGER\nINPUT a\nINPUT b\n\
         IF a AND b OR a THEN\nOUTPUT 1\nENDIF",
    );
    assert!(ir.contains("and i1"));
    assert!(ir.contains("or i1"));
}

#[test]
fn test_not_inverts_boolean() {
    let ir = compile("DECLARE b : BOOLEAN\nIF NOT b THEN\nOUTPUT 1\nENDIF");
    assert!(ir.contains("xor i1"), "NOT should lower to xor:\n{}", ir);
}

#[test]
fn test_integer_assign_into_real_slot_promotes() {
    let ir = compile("DECLARE y : REAL\ny <- 3\nOUTPUT y");
    assert!(ir.contains("double"), "expected promotion to double:\n{}", ir);
}

#[test]
fn test_real_result_truncates_into_integer_slot() {
    // `/` always produces a real; storing it back into an INTEGER slot
    // truncates toward zero.
    let ir = compile("DECLARE x : INTEGER\nx <- 10 / 4\nOUTPUT x");
    assert!(
        ir.contains("fptosi") || ir.contains("i64 2"),
        "expected truncating store in:\n{}",
        ir
    );
}

#[test]
fn test_main_returns_zero() {
    let ir = compile("OUTPUT 1");
    assert!(ir.contains("ret i32 0"));
}
