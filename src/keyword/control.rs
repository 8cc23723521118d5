//! Control flow and user-defined functions.

use std::rc::Rc;

use super::str_arg;
use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::lexer::{Atom, Block};
use crate::scope::{Scope, ScopeRef};
use crate::value::{parse_num, FunctionDef, Value};

fn arg<'a>(args: &'a [Atom], index: usize, kw: &str) -> Result<&'a Atom, EvalError> {
    args.get(index)
        .ok_or_else(|| EvalError::Syntax(format!("'{kw}' is missing parameters")))
}

/// `if COND BODY (elif COND BODY)* (else BODY)?`.
///
/// Conditions run in the current scope and any non-Null value selects;
/// untaken branches are never evaluated. No branch taken gives Null.
pub fn kw_if(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    let mut i = 0;
    loop {
        let cond = arg(args, i, "if")?;
        let body = arg(args, i + 1, "if")?;
        if !eval.eval_arg_here(scope, cond)?.is_null() {
            return eval.eval_body(scope, body);
        }
        let Some(token) = args.get(i + 2) else {
            return Ok(Value::Null);
        };
        match str_arg(eval, scope, token, "if")?.as_str() {
            "else" => return eval.eval_body(scope, arg(args, i + 3, "if")?),
            "elif" => i += 3,
            other => {
                return Err(EvalError::Syntax(format!(
                    "'if' expected 'else' or 'elif', got '{other}'"
                )))
            }
        }
    }
}

/// Selector values and case literals are strings or Null; Null matches only
/// a Null case.
fn selector(eval: &mut Evaluator, scope: &ScopeRef, atom: &Atom) -> Result<Value, EvalError> {
    match eval.eval_arg_here(scope, atom)? {
        v @ (Value::Str(_) | Value::Null) => Ok(v),
        other => Err(EvalError::TypeMismatch(format!(
            "'switch' compares strings, got {}",
            other.kind()
        ))),
    }
}

/// `switch VALUE (case LIT BODY)* (default BODY)?`.
pub fn kw_switch(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    let value = selector(eval, scope, arg(args, 0, "switch")?)?;
    let mut i = 1;
    loop {
        let Some(token) = args.get(i) else {
            return Ok(Value::Null);
        };
        match str_arg(eval, scope, token, "switch")?.as_str() {
            "case" => {
                let literal = selector(eval, scope, arg(args, i + 1, "switch")?)?;
                if literal == value {
                    return eval.eval_body(scope, arg(args, i + 2, "switch")?);
                }
                i += 3;
            }
            "default" => {
                if i + 2 != args.len() {
                    return Err(EvalError::Syntax(
                        "'default' and its body must be the last things in 'switch'".into(),
                    ));
                }
                return eval.eval_body(scope, arg(args, i + 1, "switch")?);
            }
            other => {
                return Err(EvalError::Syntax(format!(
                    "'switch' expected 'case' or 'default', got '{other}'"
                )))
            }
        }
    }
}

/// `while COND BODY`: COND re-evaluated in the current scope before every
/// iteration, BODY in a fresh child scope each time. Always Null.
pub fn kw_while(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::Syntax("'while' takes 2 parameters".into()));
    }
    let Atom::Block(body) = &args[1] else {
        return Err(EvalError::TypeMismatch("'while' body must be a block".into()));
    };
    while !eval.eval_arg_here(scope, &args[0])?.is_null() {
        eval.eval_block(body, &Scope::child(scope))?;
    }
    Ok(Value::Null)
}

/// `loop N BODY` / `loop N NAME BODY`: N evaluated once, BODY in a fresh
/// child per iteration with NAME (if given) bound to the 0-based index.
/// Iteration results aggregate like block lines; N <= 0 gives Null.
pub fn kw_loop(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    let (name, body) = match args.len() {
        2 => (None, &args[1]),
        3 => (Some(str_arg(eval, scope, &args[1], "loop")?), &args[2]),
        _ => return Err(EvalError::Syntax("'loop' takes 2 or 3 parameters".into())),
    };
    let Atom::Block(body) = body else {
        return Err(EvalError::TypeMismatch("'loop' body must be a block".into()));
    };
    let count = match eval.eval_arg_here(scope, &args[0])? {
        Value::Str(s) => parse_num(&s).ok_or_else(|| {
            EvalError::TypeMismatch(format!("'loop' expects a repetition count, got '{s}'"))
        })?,
        other => {
            return Err(EvalError::TypeMismatch(format!(
                "'loop' expects a repetition count, got {}",
                other.kind()
            )))
        }
    } as i64;

    let mut results = Vec::new();
    for index in 0..count.max(0) {
        let child = Scope::child(scope);
        if let Some(name) = &name {
            Scope::declare(&child, name, Value::Str(index.to_string()));
        }
        let value = eval.eval_block(body, &child)?;
        if !value.is_null() {
            results.push(value);
        }
    }
    Evaluator::aggregate(results)
}

pub fn kw_func(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    func_impl(eval, scope, args, true)
}

/// The `func!` spelling: the defined function is unclean and will execute
/// against its caller's scope instead of a captured one.
pub fn kw_func_unclean(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    func_impl(eval, scope, args, false)
}

fn param_name(atom: &Atom, kw: &str) -> Result<String, EvalError> {
    match atom {
        Atom::Word(w) => Ok(w.clone()),
        Atom::Str(s) => Ok(s.clone()),
        Atom::Block(_) => Err(EvalError::Syntax(format!(
            "'{kw}' parameter names must be words"
        ))),
    }
}

fn body_block<'a>(atom: &'a Atom, kw: &str) -> Result<&'a Block, EvalError> {
    match atom {
        Atom::Block(block) => Ok(block),
        _ => Err(EvalError::TypeMismatch(format!(
            "'{kw}' body must be a block"
        ))),
    }
}

fn is_word(atom: &Atom, word: &str) -> bool {
    matches!(atom, Atom::Word(w) if w == word)
}

/// Definition forms bind a `Function` value (`:=` declares, `=` assigns);
/// call forms look the name up and execute the body.
fn func_impl(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
    clean: bool,
) -> Result<Value, EvalError> {
    let name = param_name(arg(args, 0, "func")?, "func")?;

    // `func NAME` is a zero-argument call.
    if args.len() == 1 {
        return call(eval, scope, &name, &[]);
    }

    if is_word(&args[1], "=") || is_word(&args[1], ":=") {
        if args.len() != 3 {
            return Err(EvalError::Syntax(
                "'func' definitions end at their body block".into(),
            ));
        }
        return define(scope, &name, &[], &args[1], &args[2], clean);
    }

    if !is_word(&args[1], ":") {
        return Err(EvalError::Syntax(
            "'func' expects ':', '=' or ':=' after the function name".into(),
        ));
    }

    // Look for a definition separator after the parameter list.
    let separator = args[2..]
        .iter()
        .position(|a| is_word(a, "=") || is_word(a, ":="))
        .map(|k| k + 2);

    match separator {
        Some(k) => {
            if k + 2 != args.len() {
                return Err(EvalError::Syntax(
                    "'func' definitions end at their body block".into(),
                ));
            }
            let params: Vec<&Atom> = args[2..k].iter().collect();
            define(scope, &name, &params, &args[k], &args[k + 1], clean)
        }
        None => call(eval, scope, &name, &args[2..]),
    }
}

fn define(
    scope: &ScopeRef,
    name: &str,
    params: &[&Atom],
    separator: &Atom,
    body: &Atom,
    clean: bool,
) -> Result<Value, EvalError> {
    let params: Vec<String> = params
        .iter()
        .map(|a| param_name(a, "func"))
        .collect::<Result<_, _>>()?;
    let def = FunctionDef {
        params,
        body: body_block(body, "func")?.clone(),
        captured: clean.then(|| scope.clone()),
    };
    let value = Value::Function(Rc::new(def));
    if is_word(separator, ":=") {
        Scope::declare(scope, name, value);
    } else {
        Scope::assign(scope, name, value)?;
    }
    Ok(Value::Null)
}

fn call(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    name: &str,
    call_args: &[Atom],
) -> Result<Value, EvalError> {
    let def = match Scope::lookup(scope, name)? {
        Value::Function(def) => def,
        other => {
            return Err(EvalError::TypeMismatch(format!(
                "'{name}' is not a function, it is {}",
                other.kind()
            )))
        }
    };
    if def.params.len() != call_args.len() {
        return Err(EvalError::Arity {
            name: name.to_owned(),
            expected: def.params.len(),
            got: call_args.len(),
        });
    }

    // Argument blocks run in the calling scope, not a child of it.
    let mut bound = Vec::with_capacity(call_args.len());
    for atom in call_args {
        bound.push(eval.eval_arg_here(scope, atom)?);
    }

    // Clean functions execute under the scope they captured; unclean ones
    // under whoever is calling them right now.
    let parent = def.captured.clone().unwrap_or_else(|| scope.clone());
    let exec = Scope::child(&parent);
    for (param, value) in def.params.iter().zip(bound) {
        Scope::declare(&exec, param, value);
    }
    eval.eval_block(&def.body, &exec)
}
