//! Deterministic synthetic clips for tests and the CLI `synth` command.
//!
//! Generates sine/square/noise/impulse waveforms from a declarative
//! [`SyntheticSpec`] and encodes them as 16-bit PCM WAV with hound, so the
//! decode → extract → rank pipeline can be exercised without shipping audio
//! assets. Noise is seeded, so the same spec always renders the same samples.

use std::f32::consts::PI;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Seed used when a spec does not set one
pub const DEFAULT_SEED: u64 = 0x5A5A_FFF0;

/// Supported deterministic waveform patterns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticPattern {
    Sine,
    Square,
    WhiteNoise,
    ImpulseTrain,
}

impl FromStr for SyntheticPattern {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "sine" => Ok(SyntheticPattern::Sine),
            "square" => Ok(SyntheticPattern::Square),
            "white_noise" | "noise" => Ok(SyntheticPattern::WhiteNoise),
            "impulse_train" | "impulse" => Ok(SyntheticPattern::ImpulseTrain),
            other => Err(format!(
                "unknown pattern '{}' (expected sine, square, white_noise or impulse_train)",
                other
            )),
        }
    }
}

/// Configuration for a synthetic clip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticSpec {
    pub pattern: SyntheticPattern,
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_frequency_hz() -> f32 {
    220.0
}

fn default_amplitude() -> f32 {
    0.8
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl SyntheticSpec {
    pub fn new(pattern: SyntheticPattern, frequency_hz: f32) -> Self {
        Self {
            pattern,
            frequency_hz,
            amplitude: default_amplitude(),
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Render `duration_secs` of mono audio at `sample_rate`
    pub fn render(&self, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
        let frames = (duration_secs.max(0.0) * sample_rate as f32).round() as usize;
        let step = self.frequency_hz.max(1.0) / sample_rate.max(1) as f32;
        let impulse_interval = ((sample_rate as f32 / self.frequency_hz.max(1.0)) as usize).max(1);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut phase = 0.0f32;

        (0..frames)
            .map(|i| {
                let value = match self.pattern {
                    SyntheticPattern::Sine => (2.0 * PI * phase).sin() * self.amplitude,
                    SyntheticPattern::Square => {
                        if phase < 0.5 {
                            self.amplitude
                        } else {
                            -self.amplitude
                        }
                    }
                    SyntheticPattern::WhiteNoise => {
                        if self.amplitude > 0.0 {
                            rng.gen_range(-self.amplitude..self.amplitude)
                        } else {
                            0.0
                        }
                    }
                    SyntheticPattern::ImpulseTrain => {
                        if i % impulse_interval == 0 {
                            self.amplitude
                        } else {
                            0.0
                        }
                    }
                };
                phase += step;
                if phase >= 1.0 {
                    phase -= 1.0;
                }
                value
            })
            .collect()
    }
}

fn wav_spec(sample_rate: u32, channels: u16) -> hound::WavSpec {
    hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Write interleaved samples as a 16-bit PCM WAV file
pub fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    channels: u16,
) -> Result<(), hound::Error> {
    let mut writer = hound::WavWriter::create(path, wav_spec(sample_rate, channels))?;
    for &sample in samples {
        writer.write_sample(to_i16(sample))?;
    }
    writer.finalize()
}

/// Encode interleaved samples as an in-memory 16-bit PCM WAV
pub fn wav_bytes(samples: &[f32], sample_rate: u32, channels: u16) -> Result<Vec<u8>, hound::Error> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, wav_spec(sample_rate, channels))?;
        for &sample in samples {
            writer.write_sample(to_i16(sample))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}
