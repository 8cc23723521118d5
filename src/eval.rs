//! The evaluator.
//!
//! Walks the lexed tree and resolves each line through a fixed dispatch
//! order: registered keyword, note name, bare word, string head, block head.
//! Keywords receive their arguments unevaluated and use the helpers here to
//! evaluate exactly what they need, in the scope they need it in.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::audio::{AudioWave, DEFAULT_SAMPLE_RATE};
use crate::error::EvalError;
use crate::instrument::{builtin_instruments, Instrument};
use crate::keyword;
use crate::lexer::{Atom, Block};
use crate::pitch;
use crate::scope::{Scope, ScopeRef};
use crate::value::Value;

type NoteKey = (u64, u64, u64, String);

pub struct Evaluator {
    instruments: HashMap<String, Rc<Instrument>>,
    // Identical notes are rendered once per run.
    note_cache: HashMap<NoteKey, Rc<AudioWave>>,
    sample_rate: u32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new(builtin_instruments())
    }
}

impl Evaluator {
    pub fn new(instruments: HashMap<String, Rc<Instrument>>) -> Self {
        Evaluator {
            instruments,
            note_cache: HashMap::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Evaluates a block against `scope`. A single-line block passes its
    /// line's value through untransformed; otherwise the non-Null line
    /// results are aggregated into one value.
    pub fn eval_block(&mut self, block: &Block, scope: &ScopeRef) -> Result<Value, EvalError> {
        match block.lines.len() {
            0 => Ok(Value::Null),
            1 => self.eval_line(&block.lines[0].atoms, scope),
            _ => {
                let mut results = Vec::new();
                for line in &block.lines {
                    let value = self.eval_line(&line.atoms, scope)?;
                    if !value.is_null() {
                        results.push(value);
                    }
                }
                Evaluator::aggregate(results)
            }
        }
    }

    /// Combines sibling line results: all audio plays in sequence, all
    /// strings concatenate, a mixture is an error.
    pub fn aggregate(values: Vec<Value>) -> Result<Value, EvalError> {
        let Some(first) = values.first() else {
            return Ok(Value::Null);
        };
        match first {
            Value::Audio(_) => {
                let mut wave = AudioWave::new();
                for value in &values {
                    match value {
                        Value::Audio(audio) => wave.append(audio)?,
                        other => return Err(incompatible(other)),
                    }
                }
                Ok(Value::Audio(Rc::new(wave)))
            }
            Value::Str(_) => {
                let mut text = String::new();
                for value in &values {
                    match value {
                        Value::Str(s) => text.push_str(s),
                        other => return Err(incompatible(other)),
                    }
                }
                Ok(Value::Str(text))
            }
            other => Err(incompatible(other)),
        }
    }

    pub fn eval_line(&mut self, atoms: &[Atom], scope: &ScopeRef) -> Result<Value, EvalError> {
        let Some(head) = atoms.first() else {
            return Ok(Value::Null);
        };
        match head {
            Atom::Word(word) => {
                if let Some(handler) = keyword::lookup(word) {
                    trace!(keyword = %word, "dispatching keyword");
                    return handler(self, scope, &atoms[1..]);
                }
                if pitch::parse_note(word).is_some() {
                    // Implicit note call; the head is the note name.
                    return keyword::audio_words::kw_note(self, scope, atoms);
                }
                if atoms.len() == 1 {
                    return Ok(Value::Str(word.clone()));
                }
                Err(EvalError::Syntax(format!(
                    "'{word}' is not a keyword or note name"
                )))
            }
            // A quoted head turns the line into a concatenation.
            Atom::Str(_) => keyword::util::concat(self, scope, None, atoms),
            Atom::Block(block) => {
                let value = self.eval_block(block, &Scope::child(scope))?;
                if atoms.len() == 1 {
                    return Ok(value);
                }
                let rest = &atoms[1..];
                match value {
                    Value::Audio(_) => {
                        keyword::audio_words::sequence(self, scope, Some(value), rest)
                    }
                    Value::Str(_) => keyword::util::concat(self, scope, Some(value), rest),
                    Value::Null => self.eval_line(rest, scope),
                    Value::Function(_) => Err(EvalError::TypeMismatch(
                        "a function value cannot start a line".into(),
                    )),
                }
            }
        }
    }

    /// Literal argument evaluation: words stand for themselves, blocks run
    /// in a fresh child scope.
    pub fn eval_arg(&mut self, scope: &ScopeRef, atom: &Atom) -> Result<Value, EvalError> {
        match atom {
            Atom::Word(w) => Ok(Value::Str(w.clone())),
            Atom::Str(s) => Ok(Value::Str(s.clone())),
            Atom::Block(block) => self.eval_block(block, &Scope::child(scope)),
        }
    }

    /// Full argument evaluation: a word goes through line dispatch, so it
    /// may resolve to a note or keyword result instead of itself.
    pub fn resolve_arg(&mut self, scope: &ScopeRef, atom: &Atom) -> Result<Value, EvalError> {
        match atom {
            Atom::Word(_) => self.eval_line(std::slice::from_ref(atom), scope),
            Atom::Str(s) => Ok(Value::Str(s.clone())),
            Atom::Block(block) => self.eval_block(block, &Scope::child(scope)),
        }
    }

    /// Like `eval_arg`, but blocks run against `scope` itself. Conditions
    /// and function-call arguments use this so their writes land in the
    /// caller's scope.
    pub fn eval_arg_here(&mut self, scope: &ScopeRef, atom: &Atom) -> Result<Value, EvalError> {
        match atom {
            Atom::Block(block) => self.eval_block(block, scope),
            other => self.eval_arg(scope, other),
        }
    }

    /// Evaluates a selected control-flow body in a fresh child scope. A
    /// non-block body is re-dispatched as a one-atom line there.
    pub fn eval_body(&mut self, scope: &ScopeRef, atom: &Atom) -> Result<Value, EvalError> {
        let child = Scope::child(scope);
        match atom {
            Atom::Block(block) => self.eval_block(block, &child),
            other => self.eval_line(std::slice::from_ref(other), &child),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn instrument(&self, name: &str) -> Result<Rc<Instrument>, EvalError> {
        self.instruments
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::Name(name.to_owned()))
    }

    /// The instrument the scope's `instrument` variable currently names.
    pub fn current_instrument(&self, scope: &ScopeRef) -> Result<Rc<Instrument>, EvalError> {
        match Scope::lookup(scope, "instrument")? {
            Value::Str(name) => self.instrument(&name),
            other => Err(EvalError::TypeMismatch(format!(
                "variable 'instrument' must name an instrument, got {}",
                other.kind()
            ))),
        }
    }

    /// Renders a note, or reuses an earlier rendering of the same note.
    pub fn cached_note(
        &mut self,
        duration: f64,
        frequency: f64,
        intensity: f64,
        instrument: &Rc<Instrument>,
    ) -> Rc<AudioWave> {
        let key = (
            duration.to_bits(),
            frequency.to_bits(),
            intensity.to_bits(),
            instrument.name().to_owned(),
        );
        if let Some(cached) = self.note_cache.get(&key) {
            return cached.clone();
        }
        let waveform = instrument.waveform(frequency);
        let wave = Rc::new(AudioWave::render(
            duration,
            frequency,
            intensity,
            &*waveform,
            self.sample_rate,
        ));
        self.note_cache.insert(key, wave.clone());
        wave
    }
}

fn incompatible(value: &Value) -> EvalError {
    EvalError::TypeMismatch(format!(
        "incompatible value kinds in block: unexpected {}",
        value.kind()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn eval(source: &str) -> Result<Value, EvalError> {
        let (block, _) = lex(source)?;
        Evaluator::default().eval_block(&block, &Scope::root())
    }

    #[test]
    fn bare_word_is_a_string() {
        assert_eq!(eval("hello;").unwrap(), Value::Str("hello".into()));
    }

    #[test]
    fn multiple_bare_words_are_an_error() {
        assert!(matches!(eval("hello world;"), Err(EvalError::Syntax(_))));
    }

    #[test]
    fn empty_script_is_null() {
        assert_eq!(eval("").unwrap(), Value::Null);
        assert_eq!(eval("{};").unwrap(), Value::Null);
    }

    #[test]
    fn string_lines_concatenate() {
        assert_eq!(eval("ab; cd;").unwrap(), Value::Str("abcd".into()));
    }

    #[test]
    fn note_lines_sequence() {
        let value = eval("note C 1; note D 1;").unwrap();
        match value {
            Value::Audio(wave) => assert!((wave.duration() - 1.0).abs() < 0.01),
            other => panic!("expected audio, got {other:?}"),
        }
    }

    #[test]
    fn mixed_kinds_fail() {
        assert!(matches!(
            eval("note C; hello;"),
            Err(EvalError::TypeMismatch(_))
        ));
    }

    #[test]
    fn identical_notes_are_cached() {
        let (block, _) = lex("note C; note C;").unwrap();
        let mut evaluator = Evaluator::default();
        evaluator.eval_block(&block, &Scope::root()).unwrap();
        assert_eq!(evaluator.note_cache.len(), 1);
    }

    #[test]
    fn leading_block_redispatches() {
        // Audio head pulls the rest of the line into a sequence.
        let value = eval("{note C 1;} D;").unwrap();
        match value {
            Value::Audio(wave) => assert!((wave.duration() - 1.0).abs() < 0.01),
            other => panic!("expected audio, got {other:?}"),
        }
        // String head concatenates.
        assert_eq!(eval("{x;} y;").unwrap(), Value::Str("xy".into()));
        // Null head gives way to the rest of the line.
        assert_eq!(eval("{} z;").unwrap(), Value::Str("z".into()));
    }

    #[test]
    fn unknown_instrument_is_reported() {
        assert!(matches!(
            eval("var instrument = gong; note C;"),
            Err(EvalError::Name(_))
        ));
    }
}
