use super::{close, eval_ok, eval_str, seconds, string};
use crate::error::EvalError;
use crate::value::Value;

#[test]
fn audio_lines_equal_an_explicit_seq() {
    let implicit = eval_ok("note C 1; note D 1;");
    let explicit = eval_ok("seq {note C 1;} {note D 1;};");
    assert_eq!(implicit, explicit);
}

#[test]
fn string_lines_equal_an_explicit_concatenation() {
    let implicit = eval_ok("ab; cd;");
    let explicit = eval_ok("string ab cd;");
    assert_eq!(implicit, explicit);
    assert_eq!(implicit, Value::Str("abcd".into()));
}

#[test]
fn null_lines_are_ignored() {
    assert!(close(seconds("note C 1; {}; note D 1;"), 1.0));
    assert_eq!(string("ab; {}; cd;"), "abcd");
}

#[test]
fn mixed_kinds_are_an_error() {
    assert!(matches!(
        eval_str("note C; hello;"),
        Err(EvalError::TypeMismatch(_))
    ));
    assert!(matches!(
        eval_str("hello; note C;"),
        Err(EvalError::TypeMismatch(_))
    ));
}

#[test]
fn all_null_blocks_are_null() {
    assert_eq!(eval_ok("{}; {};"), Value::Null);
    assert_eq!(eval_ok(". a; . b;"), Value::Null);
}

#[test]
fn nested_blocks_aggregate_before_their_parent() {
    // The inner block resolves to one string before joining the outer one.
    assert_eq!(string("{a; b;}; c;"), "abc");
}

#[test]
fn quoted_head_concatenates_the_line() {
    assert_eq!(string("\"a b\" c {d;};"), "a bcd");
}

#[test]
fn block_head_value_drives_the_dispatch() {
    assert!(close(seconds("{note C 1;} D;"), 1.0));
    assert_eq!(string("{x;} y;"), "xy");
    assert_eq!(string("{} z;"), "z");
}
