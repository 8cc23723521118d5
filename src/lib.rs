pub mod audio;
pub mod config;
pub mod error;
pub mod eval;
pub mod instrument;
pub mod keyword;
pub mod lexer;
pub mod pitch;
pub mod scope;
pub mod value;

use std::path::Path;
use std::rc::Rc;

pub use audio::AudioWave;
pub use error::EvalError;
pub use eval::Evaluator;
pub use lexer::lex;
pub use scope::{Scope, ScopeRef};
pub use value::Value;

/// Evaluates a whole script down to its audio. The script's own
/// `config "path";` directive, if any, supplies the instruments.
pub fn evaluate(source: &str) -> Result<Rc<AudioWave>, EvalError> {
    evaluate_with_config(source, None)
}

/// Like [`evaluate`], with an instrument configuration that overrides the
/// script's `config` directive.
pub fn evaluate_with_config(
    source: &str,
    config_override: Option<&Path>,
) -> Result<Rc<AudioWave>, EvalError> {
    let (block, directive) = lexer::lex(source)?;
    let instruments = match (config_override, &directive) {
        (Some(path), _) => config::load_instruments(path)?,
        (None, Some(path)) => config::load_instruments(Path::new(path))?,
        (None, None) => instrument::builtin_instruments(),
    };
    let mut evaluator = Evaluator::new(instruments);
    match evaluator.eval_block(&block, &Scope::root())? {
        Value::Audio(wave) => Ok(wave),
        other => Err(EvalError::ScriptType(other.kind())),
    }
}
