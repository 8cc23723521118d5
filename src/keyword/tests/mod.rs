use std::rc::Rc;

use crate::audio::AudioWave;
use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::lexer::lex;
use crate::scope::Scope;
use crate::value::Value;

mod aggregation;
mod operators;

fn eval_str(source: &str) -> Result<Value, EvalError> {
    let (block, _) = lex(source).expect("script should lex");
    Evaluator::default().eval_block(&block, &Scope::root())
}

fn eval_ok(source: &str) -> Value {
    eval_str(source).expect("script should evaluate")
}

fn string(source: &str) -> String {
    match eval_ok(source) {
        Value::Str(s) => s,
        other => panic!("expected a string, got {other:?}"),
    }
}

fn audio(source: &str) -> Rc<AudioWave> {
    match eval_ok(source) {
        Value::Audio(wave) => wave,
        other => panic!("expected audio, got {other:?}"),
    }
}

fn seconds(source: &str) -> f64 {
    audio(source).duration()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.01
}
