//! Raw audio buffers.
//!
//! An `AudioWave` is a mono sample buffer plus the bookkeeping that keeps
//! mixing associative: `voices` counts how many tracks were summed in, and
//! every consumer divides by it on the way out so stacked tracks do not clip.
//! Waveform closures are unit-frequency: they take a phase in cycles, so a
//! pitch is just a factor on the argument.

use std::path::Path;

use crate::error::EvalError;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioWave {
    samples: Vec<f32>,
    sample_rate: u32,
    // 0 marks an empty wave whose sample rate is not fixed yet.
    voices: u32,
}

impl AudioWave {
    pub fn new() -> Self {
        AudioWave::default()
    }

    /// Renders a constant-frequency tone. The phase at time `t` is simply
    /// `frequency * t`.
    pub fn render(
        duration: f64,
        frequency: f64,
        amplitude: f64,
        waveform: &dyn Fn(f64) -> f64,
        sample_rate: u32,
    ) -> Self {
        let count = (duration * f64::from(sample_rate)) as usize;
        let samples = (0..count)
            .map(|i| {
                let t = i as f64 / f64::from(sample_rate);
                (amplitude * waveform(frequency * t)) as f32
            })
            .collect();
        AudioWave {
            samples,
            sample_rate,
            voices: 1,
        }
    }

    /// Renders a tone whose frequency varies over time. The phase is the
    /// integral of the instantaneous frequency, accumulated per sample.
    pub fn render_sweep(
        duration: f64,
        frequency: &dyn Fn(f64) -> f64,
        amplitude: f64,
        waveform: &dyn Fn(f64) -> f64,
        sample_rate: u32,
    ) -> Self {
        let dt = 1.0 / f64::from(sample_rate);
        let count = (duration * f64::from(sample_rate)) as usize;
        let mut samples = Vec::with_capacity(count);
        let mut phase = 0.0;
        for i in 0..count {
            samples.push((amplitude * waveform(phase)) as f32);
            phase += frequency(i as f64 * dt) * dt;
        }
        AudioWave {
            samples,
            sample_rate,
            voices: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voices == 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn voices(&self) -> u32 {
        self.voices
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / f64::from(self.sample_rate)
        }
    }

    /// An empty side takes the other's rate; two non-empty sides must agree.
    fn unify_rate(&mut self, other: &AudioWave) -> Result<(), EvalError> {
        if self.is_empty() {
            self.sample_rate = other.sample_rate;
        } else if !other.is_empty() && self.sample_rate != other.sample_rate {
            return Err(EvalError::TypeMismatch(format!(
                "cannot combine audio at {} Hz with audio at {} Hz",
                self.sample_rate, other.sample_rate
            )));
        }
        Ok(())
    }

    /// Appends `other` after this wave. Both sides are normalized by their
    /// voice counts first, so the result is a single voice again.
    pub fn append(&mut self, other: &AudioWave) -> Result<(), EvalError> {
        self.unify_rate(other)?;
        if self.voices > 0 {
            self.scale(1.0 / f64::from(self.voices));
        }
        let k = if other.voices > 0 {
            1.0 / other.voices as f32
        } else {
            1.0
        };
        self.samples.extend(other.samples.iter().map(|s| s * k));
        self.voices = 1;
        Ok(())
    }

    /// Sums `other` into this wave element-wise, as if both played at once.
    /// Voice counts add; normalization is deferred to export time.
    pub fn mix(&mut self, other: &AudioWave) -> Result<(), EvalError> {
        self.unify_rate(other)?;
        if other.samples.len() > self.samples.len() {
            self.samples.resize(other.samples.len(), 0.0);
        }
        for (slot, s) in self.samples.iter_mut().zip(&other.samples) {
            *slot += s;
        }
        self.voices += other.voices;
        Ok(())
    }

    pub fn scale(&mut self, k: f64) {
        let k = k as f32;
        for s in &mut self.samples {
            *s *= k;
        }
    }

    /// Multiplies each sample by `envelope(t)`, `t` in seconds.
    pub fn amplitude_effect(&mut self, envelope: &dyn Fn(f64) -> f64) {
        let rate = f64::from(self.sample_rate);
        for (i, s) in self.samples.iter_mut().enumerate() {
            *s *= envelope(i as f64 / rate) as f32;
        }
    }

    /// Writes 16-bit PCM, normalized by the voice count.
    pub fn export_wav(&self, path: &Path) -> Result<(), EvalError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: if self.sample_rate == 0 {
                DEFAULT_SAMPLE_RATE
            } else {
                self.sample_rate
            },
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let k = if self.voices > 0 {
            1.0 / self.voices as f32
        } else {
            1.0
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for s in &self.samples {
            writer.write_sample((s * k * 32767.0) as i16)?;
        }
        writer.finalize()?;
        Ok(())
    }
}
