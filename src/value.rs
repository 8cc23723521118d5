//! Runtime values.

use std::rc::Rc;

use crate::audio::AudioWave;
use crate::lexer::Block;
use crate::scope::ScopeRef;

/// Everything a line or block can evaluate to.
///
/// Values are immutable; rebinding a name swaps which value the slot holds.
#[derive(Debug, Clone)]
pub enum Value {
    Audio(Rc<AudioWave>),
    Str(String),
    Function(Rc<FunctionDef>),
    Null,
}

/// A user-defined function.
///
/// `captured` is `Some` for clean functions (the scope live at the definition
/// site, kept alive for as long as the function value exists) and `None` for
/// unclean ones, which execute against the caller's scope instead.
pub struct FunctionDef {
    pub params: Vec<String>,
    pub body: Block,
    pub captured: Option<ScopeRef>,
}

// The captured scope may hold the function itself, so a derived Debug
// would recurse without end.
impl std::fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionDef")
            .field("params", &self.params)
            .field("captured", &self.captured.is_some())
            .finish_non_exhaustive()
    }
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Audio(_) => "audio",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
            Value::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Audio(a), Value::Audio(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

/// Numeric parsing for the string-typed arithmetic of the language.
/// Accepts plain floats and `a/b` fractions.
pub fn parse_num(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        return Some(num / den);
    }
    s.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_fractions() {
        assert_eq!(parse_num("2"), Some(2.0));
        assert_eq!(parse_num("-0.5"), Some(-0.5));
        assert_eq!(parse_num("3/4"), Some(0.75));
        assert_eq!(parse_num("x"), None);
    }
}
