//! The environment graph.
//!
//! Scopes are shared, mutable, parent-linked nodes. A scope stays alive for
//! as long as anything can still reach it: a child scope of a running frame,
//! or a clean function that captured it. Mutations through `assign` are
//! visible to every holder, which is what lets closures observe writes made
//! after they were defined.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EvalError;
use crate::value::Value;

pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug, Default)]
pub struct Scope {
    vars: HashMap<String, Value>,
    parent: Option<ScopeRef>,
}

impl Scope {
    /// The root scope, seeded with the playing defaults every script starts
    /// from. All of them are ordinary variables and can be reassigned.
    pub fn root() -> ScopeRef {
        let mut vars = HashMap::new();
        for (name, value) in [
            ("octave", "4"),
            ("tuning", "440"),
            ("bpm", "120"),
            ("duration", "1"),
            ("instrument", "sin"),
            ("intensity", "1"),
        ] {
            vars.insert(name.to_owned(), Value::Str(value.to_owned()));
        }
        Rc::new(RefCell::new(Scope { vars, parent: None }))
    }

    /// The only way non-root scopes come to exist.
    pub fn child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            parent: Some(parent.clone()),
        }))
    }

    /// Creates (or silently overwrites) a slot in exactly this scope,
    /// shadowing any parent slot of the same name.
    pub fn declare(scope: &ScopeRef, name: &str, value: Value) {
        scope.borrow_mut().vars.insert(name.to_owned(), value);
    }

    /// Overwrites the nearest slot owning `name`, walking towards the root.
    pub fn assign(scope: &ScopeRef, name: &str, value: Value) -> Result<(), EvalError> {
        let mut current = scope.clone();
        loop {
            let parent = {
                let mut s = current.borrow_mut();
                if let Some(slot) = s.vars.get_mut(name) {
                    *slot = value;
                    return Ok(());
                }
                s.parent.clone()
            };
            match parent {
                Some(p) => current = p,
                None => return Err(EvalError::Name(name.to_owned())),
            }
        }
    }

    /// Reads the nearest slot owning `name`, walking towards the root.
    pub fn lookup(scope: &ScopeRef, name: &str) -> Result<Value, EvalError> {
        let mut current = scope.clone();
        loop {
            let parent = {
                let s = current.borrow();
                if let Some(value) = s.vars.get(name) {
                    return Ok(value.clone());
                }
                s.parent.clone()
            };
            match parent {
                Some(p) => current = p,
                None => return Err(EvalError::Name(name.to_owned())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::Str(text.to_owned())
    }

    #[test]
    fn declare_then_lookup() {
        let root = Scope::root();
        Scope::declare(&root, "x", s("1"));
        assert_eq!(Scope::lookup(&root, "x").unwrap(), s("1"));
        // Visible from descendants too.
        let child = Scope::child(&root);
        assert_eq!(Scope::lookup(&child, "x").unwrap(), s("1"));
    }

    #[test]
    fn assign_reaches_the_owning_ancestor() {
        let root = Scope::root();
        Scope::declare(&root, "x", s("1"));
        let child = Scope::child(&root);
        let grandchild = Scope::child(&child);
        Scope::assign(&grandchild, "x", s("2")).unwrap();
        // The write landed in the root slot and is visible everywhere,
        // including through scopes created before the assignment.
        assert_eq!(Scope::lookup(&root, "x").unwrap(), s("2"));
        assert_eq!(Scope::lookup(&child, "x").unwrap(), s("2"));
        assert_eq!(Scope::lookup(&grandchild, "x").unwrap(), s("2"));
    }

    #[test]
    fn declare_shadows_instead_of_assigning() {
        let root = Scope::root();
        Scope::declare(&root, "x", s("outer"));
        let child = Scope::child(&root);
        Scope::declare(&child, "x", s("inner"));
        assert_eq!(Scope::lookup(&child, "x").unwrap(), s("inner"));
        assert_eq!(Scope::lookup(&root, "x").unwrap(), s("outer"));
    }

    #[test]
    fn missing_names_fail() {
        let root = Scope::root();
        assert!(matches!(
            Scope::lookup(&root, "nope"),
            Err(EvalError::Name(_))
        ));
        assert!(matches!(
            Scope::assign(&root, "nope", s("1")),
            Err(EvalError::Name(_))
        ));
    }

    #[test]
    fn scopes_outlive_their_block_through_shared_references() {
        let root = Scope::root();
        let kept = {
            let inner = Scope::child(&root);
            Scope::declare(&inner, "only_here", s("42"));
            inner
        };
        // The block is gone; the scope is not.
        assert_eq!(Scope::lookup(&kept, "only_here").unwrap(), s("42"));
        Scope::assign(&kept, "only_here", s("43")).unwrap();
        assert_eq!(Scope::lookup(&kept, "only_here").unwrap(), s("43"));
    }
}
