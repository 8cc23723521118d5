//! Audio-producing keywords.

use std::rc::Rc;

use super::{num_arg, str_arg};
use crate::audio::AudioWave;
use crate::error::EvalError;
use crate::eval::Evaluator;
use crate::lexer::Atom;
use crate::pitch::{note_to_freq, numeric_var};
use crate::scope::ScopeRef;
use crate::value::Value;

/// The note duration in seconds: the explicit argument if present, the
/// `duration` variable otherwise, scaled from beats by the current tempo.
fn duration_secs(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    arg: Option<&Atom>,
    kw: &str,
) -> Result<f64, EvalError> {
    let beats = match arg {
        Some(atom) => num_arg(eval, scope, atom, kw)?,
        None => numeric_var(scope, "duration")?,
    };
    let bpm = numeric_var(scope, "bpm")?;
    let secs = beats * 60.0 / bpm;
    if !secs.is_finite() {
        return Err(EvalError::TypeMismatch(format!(
            "'{kw}' computed a non-finite duration from {beats} beats at bpm {bpm}"
        )));
    }
    Ok(secs)
}

/// `note NAME` / `note NAME DURATION`. Also reached implicitly when a line
/// starts with a note name.
pub fn kw_note(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EvalError::Syntax("'note' takes 1 or 2 parameters".into()));
    }
    let name = str_arg(eval, scope, &args[0], "note")?;
    let Some(freq) = note_to_freq(scope, &name)? else {
        return Err(EvalError::TypeMismatch(format!(
            "'{name}' is not a valid note name"
        )));
    };
    let duration = duration_secs(eval, scope, args.get(1), "note")?;
    let intensity = numeric_var(scope, "intensity")?;
    let instrument = eval.current_instrument(scope)?;
    Ok(Value::Audio(eval.cached_note(
        duration,
        freq,
        intensity,
        &instrument,
    )))
}

/// Folds already-started audio plus further arguments into one wave.
/// Null contributions are skipped; all-Null gives Null back.
fn combine(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    first: Option<Value>,
    atoms: &[Atom],
    kw: &str,
    fold: fn(&mut AudioWave, &AudioWave) -> Result<(), EvalError>,
) -> Result<Value, EvalError> {
    let mut wave = AudioWave::new();
    let mut changed = false;
    let mut push = |value: Value, wave: &mut AudioWave, changed: &mut bool| match value {
        Value::Audio(audio) => {
            fold(wave, &audio)?;
            *changed = true;
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(EvalError::TypeMismatch(format!(
            "'{kw}' expects audio data, got {}",
            other.kind()
        ))),
    };
    if let Some(value) = first {
        push(value, &mut wave, &mut changed)?;
    }
    for atom in atoms {
        let value = eval.resolve_arg(scope, atom)?;
        push(value, &mut wave, &mut changed)?;
    }
    Ok(if changed {
        Value::Audio(Rc::new(wave))
    } else {
        Value::Null
    })
}

/// Sequential composition; also the implicit handler for a line whose head
/// evaluated to audio.
pub fn sequence(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    first: Option<Value>,
    atoms: &[Atom],
) -> Result<Value, EvalError> {
    combine(eval, scope, first, atoms, "seq", AudioWave::append)
}

pub fn kw_seq(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    sequence(eval, scope, None, args)
}

pub fn kw_simult(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    combine(eval, scope, None, args, "simult", AudioWave::mix)
}

/// `sfx NAME` / `sfx NAME DURATION`: plays a pitchless instrument at the
/// frequency its first track was recorded at.
pub fn kw_sfx(eval: &mut Evaluator, scope: &ScopeRef, args: &[Atom]) -> Result<Value, EvalError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EvalError::Syntax("'sfx' takes 1 or 2 parameters".into()));
    }
    let name = str_arg(eval, scope, &args[0], "sfx")?;
    let instrument = eval.instrument(&name)?;
    if !instrument.pitchless() {
        return Err(EvalError::TypeMismatch(format!(
            "instrument '{name}' must be pitchless to be used as an effect"
        )));
    }
    let Some(freq) = instrument.base_freq() else {
        return Err(EvalError::TypeMismatch(format!(
            "instrument '{name}' has no recorded tracks"
        )));
    };
    let duration = duration_secs(eval, scope, args.get(1), "sfx")?;
    let intensity = numeric_var(scope, "intensity")?;
    Ok(Value::Audio(eval.cached_note(
        duration,
        freq,
        intensity,
        &instrument,
    )))
}

/// `gliss FROM TO` / `gliss FROM TO DURATION`: a linear frequency sweep.
/// The timbre is sampled once, at the mean of the two frequencies.
pub fn kw_gliss(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::Syntax("'gliss' takes 2 or 3 parameters".into()));
    }
    let mut endpoints = [0.0; 2];
    for (slot, atom) in endpoints.iter_mut().zip(args) {
        let name = str_arg(eval, scope, atom, "gliss")?;
        let Some(freq) = note_to_freq(scope, &name)? else {
            return Err(EvalError::TypeMismatch(format!(
                "'{name}' is not a valid note name"
            )));
        };
        *slot = freq;
    }
    let [from, to] = endpoints;
    let duration = duration_secs(eval, scope, args.get(2), "gliss")?;
    let intensity = numeric_var(scope, "intensity")?;
    let instrument = eval.current_instrument(scope)?;
    let waveform = instrument.waveform((from + to) / 2.0);
    let sweep = move |t: f64| from + (to - from) * t / duration;
    let wave = AudioWave::render_sweep(duration, &sweep, intensity, &*waveform, eval.sample_rate());
    Ok(Value::Audio(Rc::new(wave)))
}

/// `ampfx T0 : V0 -> T1 : V1 | AUDIO`: a linear amplitude ramp between two
/// points in time, clamped to the endpoint levels outside them.
pub fn kw_ampfx(
    eval: &mut Evaluator,
    scope: &ScopeRef,
    args: &[Atom],
) -> Result<Value, EvalError> {
    if args.len() != 9 {
        return Err(EvalError::Syntax("'ampfx' takes 9 parameters".into()));
    }
    let mut expect_token = |index: usize, token: &str| -> Result<(), EvalError> {
        let got = str_arg(eval, scope, &args[index], "ampfx")?;
        if got == token {
            Ok(())
        } else {
            Err(EvalError::Syntax(format!(
                "'ampfx' expected token '{token}', got '{got}'"
            )))
        }
    };
    expect_token(1, ":")?;
    expect_token(3, "->")?;
    expect_token(5, ":")?;
    expect_token(7, "|")?;

    let t0 = num_arg(eval, scope, &args[0], "ampfx")?;
    let v0 = num_arg(eval, scope, &args[2], "ampfx")?;
    let t1 = num_arg(eval, scope, &args[4], "ampfx")?;
    let v1 = num_arg(eval, scope, &args[6], "ampfx")?;

    let audio = match eval.resolve_arg(scope, &args[8])? {
        Value::Audio(audio) => audio,
        other => {
            return Err(EvalError::TypeMismatch(format!(
                "'ampfx' expects audio data, got {}",
                other.kind()
            )))
        }
    };

    let envelope = move |t: f64| {
        if t < t0 {
            v0
        } else if t > t1 || t1 == t0 {
            v1
        } else {
            v0 + (v1 - v0) * (t - t0) / (t1 - t0)
        }
    };
    let mut wave = (*audio).clone();
    wave.amplitude_effect(&envelope);
    Ok(Value::Audio(Rc::new(wave)))
}
