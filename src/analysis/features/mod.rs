// MfccExtractor - fingerprint extraction from decoded audio
//
// Turns one waveform into a fixed-length fingerprint: the mean of its
// mel-frequency cepstral coefficients over time.
//
// Module organization:
// - types: Fingerprint newtype
// - fft: STFT framing + power spectra
// - mel: Slaney mel filterbank (sample-rate aware)
// - dct: orthonormal DCT-II
// - mod.rs: Coordinator (MfccExtractor)
//
// Pipeline:
// 1. Power spectrogram (Hann window, centred frames)
// 2. Mel filterbank energies
// 3. Log compression to dB, clamped to `top_db` below the clip's peak
// 4. DCT-II, first `coefficient_count` coefficients
// 5. Arithmetic mean across frames
//
// References:
// - Davis, S. & Mermelstein, P. (1980). Comparison of parametric
//   representations for monosyllabic word recognition
// - Lerch, A. (2012). An Introduction to Audio Content Analysis

mod dct;
mod fft;
mod mel;
mod types;

pub use mel::{hz_to_mel, mel_to_hz, MelFilterBank};
pub use types::Fingerprint;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use dct::Dct2;
use fft::FftProcessor;

use crate::audio::{self, AudioSource, Waveform};
use crate::config::ExtractionConfig;
use crate::error::ExtractionError;

/// Floor applied before taking the logarithm of mel power
const AMIN: f32 = 1e-10;

/// MfccExtractor coordinates the fingerprint pipeline
///
/// The FFT plan and DCT basis are built once per extractor; mel filterbanks
/// are cached per sample rate since decoded clips keep their native rate.
/// The extractor is `Send + Sync` and can be shared across batch workers.
pub struct MfccExtractor {
    config: ExtractionConfig,
    fft_processor: FftProcessor,
    dct: Dct2,
    mel_banks: Mutex<HashMap<u32, Arc<MelFilterBank>>>,
}

impl MfccExtractor {
    /// Create an extractor, validating the configuration once
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        config.validate()?;

        Ok(Self {
            fft_processor: FftProcessor::new(config.fft_size),
            dct: Dct2::new(config.mel_bands, config.coefficient_count),
            mel_banks: Mutex::new(HashMap::new()),
            config,
        })
    }

    /// Extractor with default parameters and `coefficient_count` dimensions
    pub fn with_coefficients(coefficient_count: usize) -> Result<Self, ExtractionError> {
        Self::new(ExtractionConfig::with_coefficients(coefficient_count))
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Dimensionality of every fingerprint this extractor produces
    pub fn coefficient_count(&self) -> usize {
        self.config.coefficient_count
    }

    /// Decode `source` and fingerprint it
    pub fn extract(&self, source: &AudioSource) -> Result<Fingerprint, ExtractionError> {
        let waveform = audio::decode(source)?;
        self.extract_waveform(&waveform)
    }

    /// Fingerprint an already-decoded waveform
    pub fn extract_waveform(&self, waveform: &Waveform) -> Result<Fingerprint, ExtractionError> {
        if waveform.is_empty() {
            return Err(ExtractionError::EmptyAudio);
        }

        let spectrogram = self.fft_processor.power_spectrogram(
            waveform.samples(),
            self.config.hop_size,
            self.config.center,
        );
        if spectrogram.is_empty() {
            return Err(ExtractionError::EmptyAudio);
        }

        let mel_bank = self.mel_bank(waveform.sample_rate());
        let mut log_mel: Vec<Vec<f32>> = spectrogram
            .iter()
            .map(|power| {
                mel_bank
                    .apply(power)
                    .into_iter()
                    .map(|energy| 10.0 * energy.max(AMIN).log10())
                    .collect()
            })
            .collect();

        if let Some(top_db) = self.config.top_db {
            clamp_dynamic_range(&mut log_mel, top_db);
        }

        let mut sums = vec![0.0f64; self.dct.output_len()];
        for frame in &log_mel {
            for (sum, coeff) in sums.iter_mut().zip(self.dct.apply(frame)) {
                *sum += coeff as f64;
            }
        }

        let frame_count = log_mel.len() as f64;
        let fingerprint = Fingerprint::new(
            sums.into_iter()
                .map(|sum| (sum / frame_count) as f32)
                .collect(),
        );

        if !fingerprint.is_finite() {
            tracing::warn!(
                "[MfccExtractor] Non-finite coefficients for {} samples at {} Hz",
                waveform.samples().len(),
                waveform.sample_rate()
            );
            return Err(ExtractionError::EmptyAudio);
        }

        tracing::debug!(
            "[MfccExtractor] {} frames at {} Hz -> {} coefficients",
            log_mel.len(),
            waveform.sample_rate(),
            fingerprint.dimension()
        );

        Ok(fingerprint)
    }

    fn mel_bank(&self, sample_rate: u32) -> Arc<MelFilterBank> {
        let mut banks = self
            .mel_banks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        banks
            .entry(sample_rate)
            .or_insert_with(|| {
                let max_hz = self
                    .config
                    .max_frequency_hz
                    .unwrap_or(sample_rate as f32 / 2.0);
                let bank = MelFilterBank::new(
                    sample_rate,
                    self.config.fft_size,
                    self.config.mel_bands,
                    self.config.min_frequency_hz,
                    max_hz,
                );
                if bank.empty_band_count() > 0 {
                    log::warn!(
                        "[MfccExtractor] {} of {} mel bands are empty at {} Hz; consider fewer mel_bands",
                        bank.empty_band_count(),
                        bank.band_count(),
                        sample_rate
                    );
                }
                Arc::new(bank)
            })
            .clone()
    }
}

/// Fingerprint a source with default parameters and `coefficient_count` dimensions
pub fn extract(source: &AudioSource, coefficient_count: usize) -> Result<Fingerprint, ExtractionError> {
    MfccExtractor::with_coefficients(coefficient_count)?.extract(source)
}

/// Clamp every dB value to at most `top_db` below the clip-wide maximum
fn clamp_dynamic_range(log_mel: &mut [Vec<f32>], top_db: f32) {
    let peak = log_mel
        .iter()
        .flat_map(|frame| frame.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - top_db;

    for value in log_mel.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = value.max(floor);
    }
}
