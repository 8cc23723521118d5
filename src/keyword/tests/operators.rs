use super::{eval_ok, eval_str, string};
use crate::error::EvalError;
use crate::value::Value;

#[test]
fn arithmetic_on_numeric_strings() {
    assert_eq!(string("op 1 + 2;"), "3");
    assert_eq!(string("op 1 - 2.5;"), "-1.5");
    assert_eq!(string("op 3 * 4;"), "12");
    assert_eq!(string("op 2 ** 10;"), "1024");
    assert_eq!(string("op 7 / 2;"), "3.5");
    assert_eq!(string("op 7 // 2;"), "3");
    assert_eq!(string("op 1/2 + 1/4;"), "0.75");
}

#[test]
fn modulo_follows_the_divisor_sign() {
    assert_eq!(string("op 7 % 3;"), "1");
    assert_eq!(string("op -7 % 3;"), "2");
    assert_eq!(string("op -7 mod 3;"), "2");
}

#[test]
fn bit_operations_use_the_integer_part() {
    assert_eq!(string("op 12 & 10;"), "8");
    assert_eq!(string("op 12 | 10;"), "14");
    assert_eq!(string("op 12 ^ 10;"), "6");
    assert_eq!(string("op 1 << 4;"), "16");
    assert_eq!(string("op 16 >> 2;"), "4");
    assert_eq!(string("op ~ 0;"), "-1");
}

#[test]
fn out_of_range_shift_counts_are_an_error() {
    assert!(matches!(
        eval_str("op 1 << 100;"),
        Err(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        eval_str("op 1 >> -1;"),
        Err(EvalError::TypeMismatch(_))
    ));
    assert_eq!(string("op 1 << 62;"), "4611686018427387904");
}

#[test]
fn division_by_zero_follows_float_semantics() {
    assert_eq!(string("op 1 / 0;"), "inf");
    assert_eq!(string("op -1 / 0;"), "-inf");
    assert_eq!(string("op 0 / 0;"), "NaN");
}

#[test]
fn logic_is_on_nullness() {
    assert_eq!(eval_ok("op a and b;"), Value::Str("true".into()));
    assert_eq!(eval_ok("op {} and b;"), Value::Null);
    assert_eq!(eval_ok("op {} or b;"), Value::Str("true".into()));
    assert_eq!(eval_ok("op a xor b;"), Value::Null);
    assert_eq!(eval_ok("op {} xor b;"), Value::Str("true".into()));
    assert_eq!(eval_ok("op {} nand b;"), Value::Str("true".into()));
    assert_eq!(eval_ok("op {} nor {};"), Value::Str("true".into()));
    assert_eq!(eval_ok("op a xnor b;"), Value::Str("true".into()));
    assert_eq!(eval_ok("op not {};"), Value::Str("true".into()));
    assert_eq!(eval_ok("op not a;"), Value::Null);
}

#[test]
fn unary_numeric_operations() {
    assert_eq!(string("op abs -3;"), "3");
    assert_eq!(string("op log 1;"), "0");
}

#[test]
fn non_numeric_operands_fail() {
    assert!(matches!(
        eval_str("op x + 1;"),
        Err(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        eval_str("op 1 ? 1;"),
        Err(EvalError::Syntax(_))
    ));
}

#[test]
fn comparisons_return_a_condition() {
    assert_eq!(eval_ok("cmp 2 > 1;"), Value::Str("true".into()));
    assert_eq!(eval_ok("cmp 1 > 2;"), Value::Null);
    assert_eq!(eval_ok("cmp 2 >= 2;"), Value::Str("true".into()));
    assert_eq!(eval_ok("cmp 1 < 2;"), Value::Str("true".into()));
    assert_eq!(eval_ok("cmp 2 <= 1;"), Value::Null);
}

#[test]
fn equality_covers_strings_and_null() {
    assert_eq!(eval_ok("cmp a == a;"), Value::Str("true".into()));
    assert_eq!(eval_ok("cmp a == b;"), Value::Null);
    assert_eq!(eval_ok("cmp a != b;"), Value::Str("true".into()));
    assert_eq!(eval_ok("cmp {} == {};"), Value::Str("true".into()));
    assert_eq!(eval_ok("cmp a == {};"), Value::Null);
}

#[test]
fn string_utilities() {
    assert_eq!(eval_ok("strop contains abcdef cd;"), Value::Str("true".into()));
    assert_eq!(eval_ok("strop contains abcdef xy;"), Value::Null);
    assert_eq!(string("strop slice abcdef 1 3;"), "bc");
    assert_eq!(string("strop slice abcdef -2 6;"), "ef");
    assert_eq!(string("strop slice abcdef 4 2;"), "");
    assert_eq!(string("strop find abcdef cd;"), "2");
    assert_eq!(string("strop find abcdef xy;"), "-1");
    assert_eq!(string("strop replace banana an x;"), "bxxa");
    assert_eq!(string("strop strip \"  x  \";"), "x");
}

#[test]
fn var_reads_declares_and_assigns() {
    assert_eq!(string("var x := 5; var x;"), "5");
    assert_eq!(string("var x := 5; var x = 6; var x;"), "6");
    assert!(matches!(eval_str("var x = 5;"), Err(EvalError::Name(_))));
    assert!(matches!(eval_str("var x;"), Err(EvalError::Name(_))));
    assert!(matches!(
        eval_str("var x ? 5;"),
        Err(EvalError::Syntax(_))
    ));
}

#[test]
fn var_rejects_null_values() {
    assert!(matches!(
        eval_str("var x := {};"),
        Err(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn discard_swallows_everything() {
    assert_eq!(eval_ok(". a {b;} \"c\";"), Value::Null);
}

#[test]
fn print_produces_no_value() {
    assert_eq!(eval_ok("print \"\";"), Value::Null);
}
