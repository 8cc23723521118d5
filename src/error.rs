use thiserror::Error;

/// Everything that can abort a script evaluation.
///
/// There is no local recovery: the first error unwinds the whole run and is
/// reported by the caller (CLI or embedder).
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("name '{0}' is not defined")]
    Name(String),

    #[error("function '{name}' expects {expected} parameters and {got} were used")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("script must resolve to audio, got {0}")]
    ScriptType(&'static str),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio file error: {0}")]
    Wav(#[from] hound::Error),
}
