//! JSON instrument configuration.
//!
//! A config file can name other config files to load first (`preloads`) and
//! define sampled instruments from WAV tracks. Builtin instruments always
//! win over configured ones of the same name; two configured instruments
//! with the same name are an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Deserialize;
use tracing::debug;

use crate::error::EvalError;
use crate::instrument::{builtin_instruments, Instrument, Interpolation, Track};

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    preloads: Vec<PathBuf>,
    #[serde(default)]
    instruments: HashMap<String, InstrumentSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstrumentSpec {
    /// WAV path to the frequency it was recorded at.
    tracks: HashMap<PathBuf, f64>,
    #[serde(default)]
    pitchless: bool,
    #[serde(default)]
    continuous: bool,
    #[serde(default)]
    interpolation: Interpolation,
}

/// Loads a config file (and its preloads) on top of the builtin instruments.
pub fn load_instruments(path: &Path) -> Result<HashMap<String, Rc<Instrument>>, EvalError> {
    let mut configured = HashMap::new();
    let mut visited = Vec::new();
    load_into(path, &mut visited, &mut configured)?;
    // Builtins take precedence over anything configured under their names.
    configured.extend(builtin_instruments());
    Ok(configured)
}

fn load_into(
    path: &Path,
    visited: &mut Vec<PathBuf>,
    instruments: &mut HashMap<String, Rc<Instrument>>,
) -> Result<(), EvalError> {
    if visited.iter().any(|p| p == path) {
        return Err(EvalError::Config(format!(
            "circular preloading through '{}'",
            path.display()
        )));
    }
    visited.push(path.to_owned());
    debug!(path = %path.display(), "loading instrument config");

    let text = std::fs::read_to_string(path)?;
    let config: ConfigFile = serde_json::from_str(&text)
        .map_err(|e| EvalError::Config(format!("{}: {e}", path.display())))?;

    for preload in &config.preloads {
        load_into(preload, visited, instruments)?;
    }

    for (name, spec) in config.instruments {
        if instruments.contains_key(&name) {
            return Err(EvalError::Config(format!(
                "instrument '{name}' is defined twice"
            )));
        }
        let mut tracks = Vec::with_capacity(spec.tracks.len());
        for (wav, freq) in spec.tracks {
            tracks.push(Track::load(&wav, freq)?);
        }
        let instrument = Instrument::sampled(
            &name,
            tracks,
            spec.pitchless,
            spec.continuous,
            spec.interpolation,
        )?;
        instruments.insert(name, Rc::new(instrument));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..16 {
            writer.write_sample((i * 100) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn write_json(path: &Path, text: &str) {
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn loads_instruments_and_preloads() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("pluck.wav");
        write_wav(&wav);

        let base = dir.path().join("base.json");
        write_json(
            &base,
            &format!(
                r#"{{"instruments": {{"pluck": {{"tracks": {{{:?}: 220.0}}, "interpolation": "lerp"}}}}}}"#,
                wav.to_str().unwrap()
            ),
        );
        let main = dir.path().join("main.json");
        write_json(
            &main,
            &format!(
                r#"{{"preloads": [{:?}], "instruments": {{"kick": {{"tracks": {{{:?}: 60.0}}, "pitchless": true}}}}}}"#,
                base.to_str().unwrap(),
                wav.to_str().unwrap()
            ),
        );

        let instruments = load_instruments(&main).unwrap();
        assert!(instruments.contains_key("pluck"));
        assert!(instruments["kick"].pitchless());
        assert_eq!(instruments["kick"].base_freq(), Some(60.0));
        // Builtins are always present.
        assert!(instruments.contains_key("sin"));
    }

    #[test]
    fn circular_preloads_fail() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        write_json(&a, &format!(r#"{{"preloads": [{:?}]}}"#, b.to_str().unwrap()));
        write_json(&b, &format!(r#"{{"preloads": [{:?}]}}"#, a.to_str().unwrap()));
        assert!(matches!(
            load_instruments(&a),
            Err(EvalError::Config(_))
        ));
    }

    #[test]
    fn duplicate_instrument_names_fail() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("x.wav");
        write_wav(&wav);
        let a = dir.path().join("a.json");
        let b = dir.path().join("b.json");
        let instr = format!(r#"{{"x": {{"tracks": {{{:?}: 100.0}}}}}}"#, wav.to_str().unwrap());
        write_json(
            &a,
            &format!(
                r#"{{"preloads": [{:?}], "instruments": {instr}}}"#,
                b.to_str().unwrap()
            ),
        );
        write_json(&b, &format!(r#"{{"instruments": {instr}}}"#));
        assert!(load_instruments(&a).is_err());
    }

    #[test]
    fn builtin_names_shadow_configured_ones() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("x.wav");
        write_wav(&wav);
        let a = dir.path().join("a.json");
        write_json(
            &a,
            &format!(
                r#"{{"instruments": {{"sin": {{"tracks": {{{:?}: 100.0}}}}}}}}"#,
                wav.to_str().unwrap()
            ),
        );
        let instruments = load_instruments(&a).unwrap();
        assert_eq!(instruments["sin"].base_freq(), None);
    }
}
