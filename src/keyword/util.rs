//! Variables, strings, printing and arithmetic.

use std::io::Write;

use super::{num_arg, str_arg};
use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::lexer::Atom;
use crate::scope::{Scope, ScopeRef};
use crate::value::{parse_num, Value};

fn truth(condition: bool) -> Value {
    if condition {
        Value::Str("true".into())
    } else {
        Value::Null
    }
}

/// Folds an optional already-evaluated head plus further arguments into one
/// string. Null contributions are skipped; also the implicit handler for a
/// line whose head is (or evaluates to) a string.
pub fn concat(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    first: Option<Value>,
    atoms: &[Atom],
) -> Result<Value, EvalError> {
    let mut text = String::new();
    let mut push = |value: Value| match value {
        Value::Str(s) => {
            text.push_str(&s);
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(EvalError::TypeMismatch(format!(
            "'string' expects string data, got {}",
            other.kind()
        ))),
    };
    if let Some(value) = first {
        push(value)?;
    }
    for atom in atoms {
        let value = eval.eval_arg(scope, atom)?;
        push(value)?;
    }
    Ok(Value::Str(text))
}

pub fn kw_string(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    concat(eval, scope, None, args)
}

/// `var NAME` reads; `var NAME = V` assigns; `var NAME := V` declares.
pub fn kw_var(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    match args.len() {
        1 => {
            let name = str_arg(eval, scope, &args[0], "var")?;
            Scope::lookup(scope, &name)
        }
        3 => {
            let name = str_arg(eval, scope, &args[0], "var")?;
            let operator = str_arg(eval, scope, &args[1], "var")?;
            let value = eval.eval_arg(scope, &args[2])?;
            if !matches!(value, Value::Str(_) | Value::Audio(_)) {
                return Err(EvalError::TypeMismatch(format!(
                    "'var' stores strings or audio, got {}",
                    value.kind()
                )));
            }
            match operator.as_str() {
                "=" => Scope::assign(scope, &name, value)?,
                ":=" => Scope::declare(scope, &name, value),
                other => {
                    return Err(EvalError::Syntax(format!(
                        "'{other}' is not a valid operator for 'var'"
                    )))
                }
            }
            Ok(Value::Null)
        }
        _ => Err(EvalError::Syntax("'var' takes 1 or 3 parameters".into())),
    }
}

fn unescape(s: &str) -> String {
    s.replace(r"\n", "\n")
        .replace(r"\t", "\t")
        .replace(r"\r", "\r")
        .replace(r"\b", "\u{8}")
}

/// Prints string arguments to stdout, unescaped and flushed, no separator.
pub fn kw_print(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    let mut out = std::io::stdout().lock();
    for atom in args {
        let text = str_arg(eval, scope, atom, "print")?;
        out.write_all(unescape(&text).as_bytes())?;
        out.flush()?;
    }
    Ok(Value::Null)
}

/// `.` evaluates its arguments for their effects and discards the results.
pub fn kw_discard(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    for atom in args {
        eval.eval_arg(scope, atom)?;
    }
    Ok(Value::Null)
}

/// Comparison operand for `==`/`!=`: a string or Null.
fn cmp_operand(eval: &mut Evaluator, scope: &ScopeRef, atom: &Atom) -> Result<Value, EvalError> {
    match eval.eval_arg(scope, atom)? {
        v @ (Value::Str(_) | Value::Null) => Ok(v),
        other => Err(EvalError::TypeMismatch(format!(
            "'cmp' compares strings, got {}",
            other.kind()
        ))),
    }
}

/// `cmp A OP B`: numeric order comparisons, equality on strings and Null.
/// True is the string "true", false is Null, so the result is a condition.
pub fn kw_cmp(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::Syntax("'cmp' takes 3 parameters".into()));
    }
    let symbol = str_arg(eval, scope, &args[1], "cmp")?;
    match symbol.as_str() {
        ">" | ">=" | "<" | "<=" => {
            let a = num_arg(eval, scope, &args[0], "cmp")?;
            let b = num_arg(eval, scope, &args[2], "cmp")?;
            Ok(truth(match symbol.as_str() {
                ">" => a > b,
                ">=" => a >= b,
                "<" => a < b,
                _ => a <= b,
            }))
        }
        "==" | "!=" => {
            let a = cmp_operand(eval, scope, &args[0])?;
            let b = cmp_operand(eval, scope, &args[2])?;
            Ok(truth((a == b) == (symbol == "==")))
        }
        _ => Err(EvalError::Syntax(format!(
            "symbol '{symbol}' is invalid for comparisons"
        ))),
    }
}

/// Logic operand: Null is false, a string is true.
fn logic_operand(eval: &mut Evaluator, scope: &ScopeRef, atom: &Atom) -> Result<bool, EvalError> {
    match eval.eval_arg(scope, atom)? {
        Value::Str(_) => Ok(true),
        Value::Null => Ok(false),
        other => Err(EvalError::TypeMismatch(format!(
            "'op' logic expects strings or null, got {}",
            other.kind()
        ))),
    }
}

fn int_arg(eval: &mut Evaluator, scope: &ScopeRef, atom: &Atom) -> Result<i64, EvalError> {
    Ok(num_arg(eval, scope, atom, "op")? as i64)
}

/// `op A OP B` and `op OP A`: arithmetic over numeric strings, bit
/// operations over their integer parts, and Null-ness logic.
pub fn kw_op(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    match args.len() {
        3 => {
            let symbol = str_arg(eval, scope, &args[1], "op")?;
            match symbol.as_str() {
                "+" | "-" | "*" | "**" | "/" | "//" | "%" | "mod" => {
                    let a = num_arg(eval, scope, &args[0], "op")?;
                    let b = num_arg(eval, scope, &args[2], "op")?;
                    let r = match symbol.as_str() {
                        "+" => a + b,
                        "-" => a - b,
                        "*" => a * b,
                        "**" => a.powf(b),
                        "/" => a / b,
                        "//" => (a / b).floor(),
                        // Both spellings are the floored modulo, with the
                        // sign of the divisor.
                        _ => ((a % b) + b) % b,
                    };
                    Ok(Value::Str(r.to_string()))
                }
                "&" | "|" | "^" => {
                    let a = int_arg(eval, scope, &args[0])?;
                    let b = int_arg(eval, scope, &args[2])?;
                    let r = match symbol.as_str() {
                        "&" => a & b,
                        "|" => a | b,
                        _ => a ^ b,
                    };
                    Ok(Value::Str(r.to_string()))
                }
                "<<" | ">>" => {
                    let a = int_arg(eval, scope, &args[0])?;
                    let b = int_arg(eval, scope, &args[2])?;
                    let r = u32::try_from(b)
                        .ok()
                        .and_then(|count| {
                            if symbol == "<<" {
                                a.checked_shl(count)
                            } else {
                                a.checked_shr(count)
                            }
                        })
                        .ok_or_else(|| {
                            EvalError::TypeMismatch(format!(
                                "shift count must be between 0 and 63, got {b}"
                            ))
                        })?;
                    Ok(Value::Str(r.to_string()))
                }
                "and" | "or" | "xor" | "nand" | "nor" | "xnor" => {
                    let a = logic_operand(eval, scope, &args[0])?;
                    let b = logic_operand(eval, scope, &args[2])?;
                    Ok(truth(match symbol.as_str() {
                        "and" => a && b,
                        "or" => a || b,
                        "xor" => a != b,
                        "nand" => !(a && b),
                        "nor" => !(a || b),
                        _ => a == b,
                    }))
                }
                _ => Err(EvalError::Syntax(format!(
                    "symbol '{symbol}' is invalid for operations between 2 values"
                ))),
            }
        }
        2 => {
            let symbol = str_arg(eval, scope, &args[0], "op")?;
            match symbol.as_str() {
                "not" => Ok(truth(!logic_operand(eval, scope, &args[1])?)),
                "abs" => {
                    let a = num_arg(eval, scope, &args[1], "op")?;
                    Ok(Value::Str(a.abs().to_string()))
                }
                "log" => {
                    let a = num_arg(eval, scope, &args[1], "op")?;
                    Ok(Value::Str(a.ln().to_string()))
                }
                "~" => {
                    let a = int_arg(eval, scope, &args[1])?;
                    Ok(Value::Str((!a).to_string()))
                }
                _ => Err(EvalError::Syntax(format!(
                    "symbol '{symbol}' is invalid for operations on single values"
                ))),
            }
        }
        _ => Err(EvalError::Syntax(
            "'op' takes 2 or 3 parameters, depending on the operation".into(),
        )),
    }
}

/// Python-style slice bounds: negative indices count from the end, and
/// everything clamps instead of failing.
fn slice_chars(text: &str, from: i64, to: i64) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len() as i64;
    let clamp = |x: i64| -> usize {
        let x = if x < 0 { x + len } else { x };
        x.clamp(0, len) as usize
    };
    let (from, to) = (clamp(from), clamp(to));
    if from < to {
        chars[from..to].iter().collect()
    } else {
        String::new()
    }
}

/// `strop contains|slice|find|replace|strip ...`: string utilities.
/// Positions are in characters, not bytes.
pub fn kw_strop(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    let operation = str_arg(
        eval,
        scope,
        args.first()
            .ok_or_else(|| EvalError::Syntax("'strop' is missing parameters".into()))?,
        "strop",
    )?;
    let expect_len = |n: usize| -> Result<(), EvalError> {
        if args.len() == n {
            Ok(())
        } else {
            Err(EvalError::Syntax(format!(
                "'strop {operation}' takes {} parameters",
                n - 1
            )))
        }
    };
    match operation.as_str() {
        "contains" => {
            expect_len(3)?;
            let a = str_arg(eval, scope, &args[1], "strop")?;
            let b = str_arg(eval, scope, &args[2], "strop")?;
            Ok(truth(a.contains(&b)))
        }
        "slice" => {
            expect_len(4)?;
            let a = str_arg(eval, scope, &args[1], "strop")?;
            let from = int_arg(eval, scope, &args[2])?;
            let to = int_arg(eval, scope, &args[3])?;
            Ok(Value::Str(slice_chars(&a, from, to)))
        }
        "find" => {
            expect_len(3)?;
            let a = str_arg(eval, scope, &args[1], "strop")?;
            let b = str_arg(eval, scope, &args[2], "strop")?;
            let position = match a.find(&b) {
                Some(byte) => a[..byte].chars().count() as i64,
                None => -1,
            };
            Ok(Value::Str(position.to_string()))
        }
        "replace" => {
            expect_len(4)?;
            let a = str_arg(eval, scope, &args[1], "strop")?;
            let b = str_arg(eval, scope, &args[2], "strop")?;
            let c = str_arg(eval, scope, &args[3], "strop")?;
            Ok(Value::Str(a.replace(&b, &c)))
        }
        "strip" => {
            expect_len(2)?;
            let a = str_arg(eval, scope, &args[1], "strop")?;
            Ok(Value::Str(a.trim().to_owned()))
        }
        _ => Err(EvalError::Syntax(format!(
            "invalid operation for 'strop': '{operation}'"
        ))),
    }
}
