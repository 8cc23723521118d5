//! Note-name grammar.
//!
//! Recognizes tokens like `A`, `C#+`, `Bb(-12.5c)~1`, `440Hz` and the rest
//! marker `_`, and turns them into frequencies against the scope's current
//! `octave` and `tuning`. The evaluator consults this module; it never
//! re-implements any of it.

use crate::error::EvalError;
use crate::scope::{Scope, ScopeRef};
use crate::value::{parse_num, Value};

/// Middle C when `tuning` is the default 440 for A4; kept as a test oracle.
pub const DEFAULT_C_TUNING: f64 = 261.6255653006;

/// A parsed note token, before the scope's octave and tuning are applied.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteSpec {
    /// Explicit frequency, from a `...Hz` token.
    Hertz(f64),
    /// A pause; renders as frequency 0.
    Rest,
    /// A named tone. `semitones` folds the base letter, accidentals, cents
    /// and relative octave jumps, rebased so that `tuning` refers to octave
    /// 4. `absolute_octave` is set only for the `~?digits` suffix form.
    Tone {
        semitones: f64,
        absolute_octave: Option<f64>,
    },
}

/// Semitone distance from A within the octave. The octave starts at C, so
/// everything from C up is shifted an octave down to stay below the A.
fn base_semitones(letter: char) -> Option<i32> {
    Some(match letter {
        'A' => 0,
        'B' => 2,
        'C' => 3 - 12,
        'D' => 5 - 12,
        'E' => 7 - 12,
        'F' => 8 - 12,
        'G' => 10 - 12,
        _ => return None,
    })
}

/// Parses a note token. Returns `None` for anything that is not a note,
/// which the evaluator treats as "try the next interpretation", never as an
/// error.
pub fn parse_note(token: &str) -> Option<NoteSpec> {
    if let Some(hz) = token.strip_suffix("Hz") {
        return hz.parse::<f64>().ok().map(NoteSpec::Hertz);
    }
    if token == "_" {
        return Some(NoteSpec::Rest);
    }

    let mut chars = token.chars().peekable();
    // Rebase by -48: `tuning` is given with respect to the fourth octave.
    let mut semitones = f64::from(base_semitones(chars.next()?)?) - 48.0;

    while let Some(&c) = chars.peek() {
        match c {
            '#' => semitones += 1.0,
            'b' => semitones -= 1.0,
            _ => break,
        }
        chars.next();
    }

    if chars.peek() == Some(&'(') {
        chars.next();
        let mut number = String::new();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            number.push(chars.next()?);
            while matches!(chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.') {
                number.push(chars.next()?);
            }
        }
        if chars.next()? != 'c' || chars.next()? != ')' {
            return None;
        }
        if !number.is_empty() {
            semitones += number.parse::<f64>().ok()? / 100.0;
        }
    }

    let mut relative_jumps = false;
    while let Some(&c) = chars.peek() {
        match c {
            '+' => semitones += 12.0,
            '-' => semitones -= 12.0,
            _ => break,
        }
        relative_jumps = true;
        chars.next();
    }

    let mut absolute_octave = None;
    if chars.peek().is_some() {
        let negated = chars.peek() == Some(&'~');
        if negated {
            chars.next();
        }
        let mut digits = String::new();
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            digits.push(chars.next()?);
        }
        if digits.is_empty() || chars.next().is_some() {
            // Trailing garbage, or '~' with no digits.
            return None;
        }
        let octave: f64 = digits.parse().ok()?;
        absolute_octave = Some(if negated { -octave } else { octave });
    }

    // A relative and an absolute octave together make no sense.
    if relative_jumps && absolute_octave.is_some() {
        return None;
    }

    Some(NoteSpec::Tone {
        semitones,
        absolute_octave,
    })
}

/// The frequency of a parsed note under a given default octave and tuning.
pub fn frequency(spec: &NoteSpec, octave: f64, tuning: f64) -> f64 {
    match spec {
        NoteSpec::Hertz(hz) => *hz,
        NoteSpec::Rest => 0.0,
        NoteSpec::Tone {
            semitones,
            absolute_octave,
        } => {
            let total = semitones + 12.0 * absolute_octave.unwrap_or(octave);
            tuning * (total / 12.0).exp2()
        }
    }
}

/// Resolves a token against the scope's `octave` and `tuning` variables.
/// `Ok(None)` means "not a note name".
pub fn note_to_freq(scope: &ScopeRef, token: &str) -> Result<Option<f64>, EvalError> {
    let Some(spec) = parse_note(token) else {
        return Ok(None);
    };
    let octave = numeric_var(scope, "octave")?;
    let tuning = numeric_var(scope, "tuning")?;
    Ok(Some(frequency(&spec, octave, tuning)))
}

/// Reads a scope variable that must hold a numeric string.
pub fn numeric_var(scope: &ScopeRef, name: &str) -> Result<f64, EvalError> {
    match Scope::lookup(scope, name)? {
        Value::Str(s) => parse_num(&s).ok_or_else(|| {
            EvalError::TypeMismatch(format!("variable '{name}' is not a number: '{s}'"))
        }),
        other => Err(EvalError::TypeMismatch(format!(
            "variable '{name}' must be a numeric string, got {}",
            other.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(token: &str) -> f64 {
        frequency(&parse_note(token).unwrap(), 4.0, 440.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn reference_pitches() {
        assert!(close(freq("A"), 440.0));
        assert!(close(freq("A+"), 880.0));
        assert!(close(freq("A3"), 220.0));
        assert!(close(freq("C"), DEFAULT_C_TUNING));
        // Double sharp, up 50 cents, one octave down.
        assert!(close(freq("A##(+50c)-"), 254.177));
    }

    #[test]
    fn explicit_frequency_and_rest() {
        assert_eq!(parse_note("440Hz"), Some(NoteSpec::Hertz(440.0)));
        assert_eq!(parse_note("_"), Some(NoteSpec::Rest));
        assert!(close(freq("123.5Hz"), 123.5));
        assert_eq!(frequency(&NoteSpec::Rest, 4.0, 440.0), 0.0);
    }

    #[test]
    fn accidentals_and_cents() {
        assert!(close(freq("A#"), 440.0 * (1.0 / 12.0f64).exp2()));
        assert!(close(freq("Ab"), 440.0 * (-1.0 / 12.0f64).exp2()));
        // Mixed accidentals cancel.
        assert!(close(freq("A#b"), 440.0));
        // An empty cent group is allowed.
        assert!(close(freq("A(c)"), 440.0));
        assert!(close(freq("A(+100c)"), freq("A#")));
    }

    #[test]
    fn absolute_octaves() {
        assert!(close(freq("A5"), 880.0));
        // `~` negates the octave number.
        assert!(close(freq("A~0"), 440.0 / 16.0));
        assert!(close(freq("A~2") * 2.0, freq("A~1")));
        assert!(close(freq("A~1"), freq("A-----")));
    }

    #[test]
    fn rejected_tokens() {
        for token in ["H", "a", "A+~2", "Ax", "A(50c)", "A(+50c", "A~", "~2", ""] {
            assert_eq!(parse_note(token), None, "token {token:?}");
        }
    }
}
