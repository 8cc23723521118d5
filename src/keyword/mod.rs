//! The keyword table.
//!
//! Keywords are the only operations of the language. The table is fixed at
//! startup and read-only afterwards; handlers get the evaluator, the scope
//! of the line being evaluated, and their arguments unevaluated.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::lexer::Atom;
use crate::scope::ScopeRef;
use crate::value::Value;

pub mod audio_words;
pub mod control;
pub mod util;

#[cfg(test)]
mod tests;

pub type KeywordFn = fn(&mut Evaluator, &ScopeRef, &[Atom]) -> Result<Value, EvalError>;

static REGISTRY: OnceLock<HashMap<&'static str, KeywordFn>> = OnceLock::new();

pub fn lookup(name: &str) -> Option<KeywordFn> {
    registry().get(name).copied()
}

fn registry() -> &'static HashMap<&'static str, KeywordFn> {
    REGISTRY.get_or_init(|| {
        let entries: &[(&'static str, KeywordFn)] = &[
            ("note", audio_words::kw_note),
            ("seq", audio_words::kw_seq),
            ("simult", audio_words::kw_simult),
            ("sfx", audio_words::kw_sfx),
            ("gliss", audio_words::kw_gliss),
            ("ampfx", audio_words::kw_ampfx),
            ("if", control::kw_if),
            ("switch", control::kw_switch),
            ("while", control::kw_while),
            ("loop", control::kw_loop),
            ("func", control::kw_func),
            // The unclean spelling shares the handler, not the capture.
            ("func!", control::kw_func_unclean),
            ("var", util::kw_var),
            ("print", util::kw_print),
            ("string", util::kw_string),
            (".", util::kw_discard),
            ("cmp", util::kw_cmp),
            ("op", util::kw_op),
            ("strop", util::kw_strop),
        ];
        entries.iter().copied().collect()
    })
}

/// Evaluates an argument that must come out as a string.
pub(crate) fn str_arg(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    atom: &Atom,
    kw: &str,
) -> Result<String, EvalError> {
    match eval.eval_arg(scope, atom)? {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::TypeMismatch(format!(
            "'{kw}' expects a string parameter, got {}",
            other.kind()
        ))),
    }
}

/// Evaluates an argument that must come out as a numeric string.
pub(crate) fn num_arg(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    atom: &Atom,
    kw: &str,
) -> Result<f64, EvalError> {
    let s = str_arg(eval, scope, atom, kw)?;
    crate::value::parse_num(&s).ok_or_else(|| {
        EvalError::TypeMismatch(format!("'{kw}' expects a number, got '{s}'"))
    })
}
