//! End-to-end driver tests: pseudocode on stdin, IR on stderr.

use assert_cmd::Command;
use predicates::prelude::*;

fn pscc() -> Command {
    Command::cargo_bin("pscc").expect("pscc binary should build")
}

#[test]
fn test_empty_input_emits_empty_main() {
    pscc()
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("define i32 @main"))
        .stderr(predicate::str::contains("ret i32 0"));
}

#[test]
fn test_ir_goes_to_stderr_not_stdout() {
    pscc()
        .write_stdin("DECLARE x : INTEGER\nOUTPUT x\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_constant_expression_is_folded() {
    pscc()
        .write_stdin("DECLARE x : INTEGER\nx <- 21 * 2\nOUTPUT x\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("i64 42"))
        .stderr(predicate::str::contains("@printf"));
}

#[test]
fn test_for_loop_shape() {
    pscc()
        .write_stdin("DECLARE i : INTEGER\nFOR i <- 1 TO 3\nOUTPUT i\nNEXT i\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("forcond:"))
        .stderr(predicate::str::contains("icmp sle"));
}

#[test]
fn test_descending_for_uses_ge_comparison() {
    pscc()
        .write_stdin("DECLARE i : INTEGER\nFOR i <- 3 TO 1 STEP -1\nOUTPUT i\nNEXT i\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("icmp sge"));
}

#[test]
fn test_whole_array_output() {
    pscc()
        .write_stdin(
            "DECLARE a : ARRAY[1:3] OF INTEGER\n\
             a[1] <- 10\na[2] <- 20\na[3] <- 30\n\
             OUTPUT a\n",
        )
        .assert()
        .success()
        .stderr(predicate::str::contains("@malloc(i64 24)"))
        .stderr(predicate::str::contains("arr_loop"));
}

#[test]
fn test_out_of_bounds_access_compiles_with_guard() {
    // The failure happens at the compiled program's runtime; the compiler
    // itself succeeds and plants the guard.
    pscc()
        .write_stdin("DECLARE a : ARRAY[1:3] OF INTEGER\nOUTPUT a[5]\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Array index out of bounds"))
        .stderr(predicate::str::contains("unreachable"));
}

#[test]
fn test_division_is_guarded() {
    pscc()
        .write_stdin("DECLARE x : INTEGER\nDECLARE y : REAL\ny <- 10 / x\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Division by zero"));
}

#[test]
fn test_mixed_division_promotes() {
    pscc()
        .write_stdin(
            "DECLARE x : INTEGER\nDECLARE y : REAL\nx <- 5\ny <- x / 2\nOUTPUT y\n",
        )
        .assert()
        .success()
        .stderr(predicate::str::contains("fdiv"))
        .stderr(predicate::str::contains("%f"));
}

#[test]
fn test_byref_procedure_scenario() {
    pscc()
        .write_stdin(
            "PROCEDURE p(BYREF n : INTEGER)\n\
             n <- n + 1\n\
             ENDPROCEDURE\n\
             DECLARE x : INTEGER\n\
             x <- 41\n\
             CALL p(x)\n\
             OUTPUT x\n",
        )
        .assert()
        .success()
        .stderr(predicate::str::contains("define void @p(i64*"))
        .stderr(predicate::str::contains("call void @p(i64* %x"));
}

#[test]
fn test_syntax_error_is_reported_but_ir_still_emitted() {
    // Recovery: the bad token is skipped and the rest still compiles.
    pscc()
        .write_stdin("] \nDECLARE x : INTEGER\nOUTPUT x\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("define i32 @main"));
}

#[test]
fn test_semantic_error_drops_construct() {
    pscc()
        .write_stdin("missing <- 1\nOUTPUT 7\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown variable"))
        .stderr(predicate::str::contains("i64 7"));
}

#[test]
fn test_comments_are_ignored() {
    pscc()
        .write_stdin("// just a comment\nOUTPUT 1 // trailing\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("define i32 @main"));
}

#[test]
fn test_runtime_externs_declared() {
    pscc()
        .write_stdin("OUTPUT 1\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("declare i32 @printf"))
        .stderr(predicate::str::contains("declare i8* @malloc"))
        .stderr(predicate::str::contains("declare void @exit"));
}
