mod common;

use common::{run_err, run_ok};
use yahaha::Value;
use yahaha::interpreter::RuntimeError;

// ============================================================================
// ARITHMETIC
// ============================================================================

#[test]
fn test_integer_arithmetic_stays_integer() {
    assert_eq!(run_ok("2 + 3;"), Value::Int(5));
    assert_eq!(run_ok("2 - 3;"), Value::Int(-1));
    assert_eq!(run_ok("2 * 3;"), Value::Int(6));
}

#[test]
fn test_mixed_arithmetic_promotes_to_real() {
    assert_eq!(run_ok("1 + 2.5;"), Value::Real(3.5));
    assert_eq!(run_ok("2.5 + 1;"), Value::Real(3.5));
    assert_eq!(run_ok("2 * 1.5;"), Value::Real(3.0));
    assert_eq!(run_ok("2.5 - 1;"), Value::Real(1.5));
}

#[test]
fn test_promotion_is_symmetric() {
    // i + r = r + i, and both sides are real.
    let left = run_ok("3 + 0.5;");
    let right = run_ok("0.5 + 3;");
    assert_eq!(left, right);
    assert!(matches!(left, Value::Real(_)));
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(run_ok("7 / 2;"), Value::Int(3));
    assert_eq!(run_ok("-7 / 2;"), Value::Int(-3));
    assert_eq!(run_ok("6 / 3;"), Value::Int(2));
}

#[test]
fn test_real_division() {
    assert_eq!(run_ok("7.0 / 2;"), Value::Real(3.5));
    assert_eq!(run_ok("7 / 2.0;"), Value::Real(3.5));
}

#[test]
fn test_integer_division_by_zero_fails() {
    assert!(matches!(run_err("1 / 0;"), RuntimeError::Default { .. }));
}

#[test]
fn test_real_division_by_zero_is_infinite() {
    match run_ok("1.0 / 0.0;") {
        Value::Real(r) => assert!(r.is_infinite()),
        other => panic!("expected a real, got {:?}", other),
    }
}

#[test]
fn test_integer_overflow_is_reported() {
    assert!(matches!(
        run_err("9223372036854775807 + 1;"),
        RuntimeError::Default { .. }
    ));
    assert!(matches!(
        run_err("9223372036854775807 * 2;"),
        RuntimeError::Default { .. }
    ));
}

// ============================================================================
// CONCATENATION VIA `+`
// ============================================================================

#[test]
fn test_string_concatenation() {
    assert_eq!(run_ok("\"foo\" + \"bar\";"), Value::Str("foobar".into()));
}

#[test]
fn test_array_concatenation() {
    let source = "var a := [1, 2] + [3]; a[2];";
    assert_eq!(run_ok(source), Value::Int(3));
}

#[test]
fn test_tuple_concatenation_preserves_keys() {
    assert_eq!(run_ok("var t := {a := 1} + {b := 2}; t.b;"), Value::Int(2));
    // Duplicate keys are kept; lookup still returns the first match.
    assert_eq!(run_ok("var t := {a := 1} + {a := 2}; t.a;"), Value::Int(1));
    assert_eq!(run_ok("var t := {a := 1} + {a := 2}; t.1;"), Value::Int(2));
}

#[test]
fn test_add_type_mismatch() {
    assert!(matches!(
        run_err("1 + \"a\";"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("[1] + {a := 1};"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("\"a\" + 1;"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_subtraction_is_numeric_only() {
    assert!(matches!(
        run_err("\"a\" - \"b\";"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("[1] * [2];"),
        RuntimeError::TypeMismatch { .. }
    ));
}

// ============================================================================
// ORDERING AND EQUALITY
// ============================================================================

#[test]
fn test_ordering() {
    assert_eq!(run_ok("1 < 2;"), Value::Bool(true));
    assert_eq!(run_ok("2 <= 2;"), Value::Bool(true));
    assert_eq!(run_ok("3 > 4;"), Value::Bool(false));
    assert_eq!(run_ok("4 >= 4;"), Value::Bool(true));
}

#[test]
fn test_ordering_promotes_integers() {
    assert_eq!(run_ok("1 < 1.5;"), Value::Bool(true));
    assert_eq!(run_ok("2.0 <= 2;"), Value::Bool(true));
}

#[test]
fn test_strings_are_not_ordered() {
    assert!(matches!(
        run_err("\"a\" < \"b\";"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_bools_are_not_ordered() {
    assert!(matches!(
        run_err("true < false;"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_equality() {
    assert_eq!(run_ok("1 = 1;"), Value::Bool(true));
    assert_eq!(run_ok("1 = 2;"), Value::Bool(false));
    assert_eq!(run_ok("1 = 1.0;"), Value::Bool(true));
    assert_eq!(run_ok("true = true;"), Value::Bool(true));
    assert_eq!(run_ok("\"a\" = \"a\";"), Value::Bool(true));
    assert_eq!(run_ok("\"a\" = \"b\";"), Value::Bool(false));
}

#[test]
fn test_inequality() {
    assert_eq!(run_ok("1 /= 2;"), Value::Bool(true));
    assert_eq!(run_ok("\"a\" /= \"b\";"), Value::Bool(true));
    assert_eq!(run_ok("1 /= 1.0;"), Value::Bool(false));
}

#[test]
fn test_mixed_kind_equality_fails() {
    assert!(matches!(
        run_err("1 = \"a\";"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("true = 1;"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_compound_values_are_not_comparable() {
    assert!(matches!(
        run_err("[1] = [1];"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("{a := 1} = {a := 1};"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_empty_compares_equal_only_to_itself() {
    assert_eq!(run_ok("var x; var y; x = y;"), Value::Bool(true));
    assert_eq!(run_ok("var x; x = 1;"), Value::Bool(false));
    assert_eq!(run_ok("var x; x /= 1;"), Value::Bool(true));
}

// ============================================================================
// LOGICAL OPERATORS
// ============================================================================

#[test]
fn test_logical_tables() {
    assert_eq!(run_ok("true and true;"), Value::Bool(true));
    assert_eq!(run_ok("true and false;"), Value::Bool(false));
    assert_eq!(run_ok("false or true;"), Value::Bool(true));
    assert_eq!(run_ok("false or false;"), Value::Bool(false));
    assert_eq!(run_ok("true xor false;"), Value::Bool(true));
    assert_eq!(run_ok("true xor true;"), Value::Bool(false));
}

#[test]
fn test_logical_requires_bools() {
    assert!(matches!(
        run_err("1 and true;"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("true or \"a\";"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_and_does_not_short_circuit() {
    // Both sides are evaluated even when the left side decides the
    // result.
    let source = "var hits := 0; \
                  var bump := func() is hits := hits + 1; true; end; \
                  false and bump(); \
                  hits;";
    assert_eq!(run_ok(source), Value::Int(1));
}

#[test]
fn test_or_does_not_short_circuit() {
    let source = "var hits := 0; \
                  var bump := func() is hits := hits + 1; false; end; \
                  true or bump(); \
                  hits;";
    assert_eq!(run_ok(source), Value::Int(1));
}

#[test]
fn test_xor_is_inequality_on_bools() {
    assert_eq!(run_ok("(true xor false) = (true /= false);"), Value::Bool(true));
}

// ============================================================================
// UNARY OPERATORS
// ============================================================================

#[test]
fn test_unary_numeric() {
    assert_eq!(run_ok("-5;"), Value::Int(-5));
    assert_eq!(run_ok("+5;"), Value::Int(5));
    assert_eq!(run_ok("-2.5;"), Value::Real(-2.5));
    assert_eq!(run_ok("- -5;"), Value::Int(5));
}

#[test]
fn test_unary_not() {
    assert_eq!(run_ok("not true;"), Value::Bool(false));
    assert_eq!(run_ok("not not true;"), Value::Bool(true));
}

#[test]
fn test_unary_type_errors() {
    assert!(matches!(
        run_err("not 1;"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("-true;"),
        RuntimeError::TypeMismatch { .. }
    ));
    assert!(matches!(
        run_err("-\"a\";"),
        RuntimeError::TypeMismatch { .. }
    ));
}

#[test]
fn test_empty_is_rejected_by_operators() {
    assert!(matches!(
        run_err("var x; x + 1;"),
        RuntimeError::NullAccess { .. }
    ));
    assert!(matches!(
        run_err("var x; x < 1;"),
        RuntimeError::NullAccess { .. }
    ));
    assert!(matches!(
        run_err("var x; x and true;"),
        RuntimeError::NullAccess { .. }
    ));
    assert!(matches!(
        run_err("var x; not x;"),
        RuntimeError::NullAccess { .. }
    ));
    assert!(matches!(
        run_err("var x; -x;"),
        RuntimeError::NullAccess { .. }
    ));
}
