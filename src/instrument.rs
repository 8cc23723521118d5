//! Instruments: how a frequency becomes a timbre.
//!
//! An instrument turns a target frequency into a unit-frequency waveform
//! closure (phase in cycles in, amplitude out) that the audio backend then
//! samples. Builtins are pure math; sampled instruments replay WAV tracks
//! recorded at known frequencies, picking or blending the nearest ones in
//! log-frequency space.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;

use crate::error::EvalError;

pub type Waveform<'a> = Box<dyn Fn(f64) -> f64 + 'a>;

/// Folds interleaved frames down to one sample per frame.
fn average_channels(interleaved: &[f32], channels: usize) -> Vec<f32> {
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// One recording backing a sampled instrument.
#[derive(Debug, Clone)]
pub struct Track {
    freq: f64,
    sample_rate: u32,
    samples: Vec<f32>,
}

impl Track {
    /// Loads a WAV file, averaging channels down to mono and normalizing to
    /// the [-1, 1] range the rest of the pipeline uses.
    pub fn load(path: &Path, freq: f64) -> Result<Track, EvalError> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let mono: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                let raw: Result<Vec<f32>, _> = reader.samples::<f32>().collect();
                average_channels(&raw?, channels)
            }
            hound::SampleFormat::Int => {
                let max = f32::from(i16::MAX);
                let raw: Result<Vec<f32>, _> = reader
                    .samples::<i16>()
                    .map(|s| s.map(|v| f32::from(v) / max))
                    .collect();
                average_channels(&raw?, channels)
            }
        };

        Ok(Track {
            freq,
            sample_rate: spec.sample_rate,
            samples: mono,
        })
    }

    #[cfg(test)]
    fn synthetic(freq: f64, sample_rate: u32, samples: Vec<f32>) -> Track {
        Track {
            freq,
            sample_rate,
            samples,
        }
    }

    pub fn freq(&self) -> f64 {
        self.freq
    }

    /// Replays the recording for a given phase in cycles. Dividing by the
    /// recorded frequency lines the track's own pitch up with phase 1.0 per
    /// cycle; outside the recording the track is silent.
    fn sample_at(&self, phase: f64) -> f64 {
        let index = phase * f64::from(self.sample_rate) / self.freq;
        if index >= 0.0 && (index as usize) < self.samples.len() {
            f64::from(self.samples[index as usize])
        } else {
            0.0
        }
    }

    /// The length of the recording expressed in cycles of its own pitch.
    fn period_cycles(&self) -> f64 {
        self.freq * self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Track selection for sampled instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Nearest track in log-frequency space.
    #[default]
    None,
    /// Blend of the nearest tracks above and below the target.
    Lerp,
}

#[derive(Debug)]
enum Timbre {
    Sin,
    Square,
    Saw,
    Sampled {
        // Non-empty, checked by `Instrument::sampled`.
        tracks: Vec<Track>,
        pitchless: bool,
        continuous: bool,
        interpolation: Interpolation,
    },
}

#[derive(Debug)]
pub struct Instrument {
    name: String,
    timbre: Timbre,
}

impl Instrument {
    pub fn sampled(
        name: &str,
        tracks: Vec<Track>,
        pitchless: bool,
        continuous: bool,
        interpolation: Interpolation,
    ) -> Result<Instrument, EvalError> {
        if tracks.is_empty() {
            return Err(EvalError::Config(format!(
                "instrument '{name}' has no tracks"
            )));
        }
        Ok(Instrument {
            name: name.to_owned(),
            timbre: Timbre::Sampled {
                tracks,
                pitchless,
                continuous,
                interpolation,
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pitchless(&self) -> bool {
        matches!(self.timbre, Timbre::Sampled { pitchless: true, .. })
    }

    /// The recorded frequency of the first track; what `sfx` plays at.
    pub fn base_freq(&self) -> Option<f64> {
        match &self.timbre {
            Timbre::Sampled { tracks, .. } => Some(tracks[0].freq),
            _ => None,
        }
    }

    /// The waveform to sample for a note at `frequency`. The closure takes a
    /// phase in cycles; the backend drives it at the actual pitch.
    pub fn waveform(&self, frequency: f64) -> Waveform<'_> {
        match &self.timbre {
            Timbre::Sin => Box::new(|t| (2.0 * PI * t).sin()),
            Timbre::Square => Box::new(|t| (2.0 * PI * t).sin().signum()),
            Timbre::Saw => Box::new(|t| (2.0 * PI * t).sin().asin()),
            Timbre::Sampled {
                tracks,
                pitchless,
                continuous,
                interpolation,
            } => {
                let raw: Waveform<'_> = if *pitchless || tracks.len() == 1 {
                    nearest(tracks, frequency)
                } else {
                    match interpolation {
                        Interpolation::None => nearest(tracks, frequency),
                        Interpolation::Lerp => lerp(tracks, frequency),
                    }
                };
                if *continuous {
                    let period = tracks[0].period_cycles();
                    Box::new(move |t| raw(t % period))
                } else {
                    raw
                }
            }
        }
    }
}

fn nearest<'a>(tracks: &'a [Track], frequency: f64) -> Waveform<'a> {
    let track = tracks
        .iter()
        .min_by(|a, b| {
            let da = (frequency.log2() - a.freq.log2()).abs();
            let db = (frequency.log2() - b.freq.log2()).abs();
            da.total_cmp(&db)
        })
        .unwrap_or(&tracks[0]);
    Box::new(move |t| track.sample_at(t))
}

/// Blend of the closest track below and the closest above, weighted by the
/// target's position between them in log-frequency space.
fn lerp<'a>(tracks: &'a [Track], frequency: f64) -> Waveform<'a> {
    let mut upper: Option<&Track> = None;
    let mut lower: Option<&Track> = None;
    for track in tracks {
        if track.freq > frequency {
            if upper.map_or(true, |u| track.freq < u.freq) {
                upper = Some(track);
            }
        } else if lower.map_or(true, |l| track.freq > l.freq) {
            lower = Some(track);
        }
    }
    let lower = lower.or(upper);
    let upper = upper.or(lower);
    match (lower, upper) {
        (Some(lo), Some(hi)) => {
            let ratio = if hi.freq == lo.freq {
                0.0
            } else {
                (frequency.log2() - lo.freq.log2()) / (hi.freq.log2() - lo.freq.log2())
            };
            Box::new(move |t| {
                let a = lo.sample_at(t);
                a + ratio * (hi.sample_at(t) - a)
            })
        }
        // Unreachable past the non-empty check; render silence rather than panic.
        _ => Box::new(|_| 0.0),
    }
}

/// The instruments every script starts with. Configuration may add more but
/// cannot replace these names.
pub fn builtin_instruments() -> HashMap<String, Rc<Instrument>> {
    let mut map = HashMap::new();
    for (name, timbre) in [
        ("sin", Timbre::Sin),
        ("square", Timbre::Square),
        ("saw", Timbre::Saw),
    ] {
        map.insert(
            name.to_owned(),
            Rc::new(Instrument {
                name: name.to_owned(),
                timbre,
            }),
        );
    }
    map
}
