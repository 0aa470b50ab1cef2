// FFT module - short-time Fourier transform framing
//
// Slices a mono signal into overlapping Hann-windowed frames and returns the
// power spectrum of each. Frame geometry follows the centred STFT convention:
// with centring on, half a window of zeros is added to both ends so the
// first frame is centred on sample 0.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// FFT processor that computes power spectra from audio frames
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    /// Periodic Hann window (pre-computed)
    window: Vec<f32>,
}

impl FftProcessor {
    /// Create a new FFT processor
    ///
    /// # Arguments
    /// * `fft_size` - FFT window size (2048 by default for fingerprints)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);

        Self {
            fft,
            fft_size,
            window: hann_window(fft_size),
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of positive-frequency bins per frame
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Number of frames a signal of `len` samples yields
    pub fn frame_count(&self, len: usize, hop_size: usize, center: bool) -> usize {
        if len == 0 || hop_size == 0 {
            return 0;
        }
        if center {
            1 + len / hop_size
        } else if len < self.fft_size {
            0
        } else {
            1 + (len - self.fft_size) / hop_size
        }
    }

    /// Compute the power spectrogram (`frames × bins`) of `samples`
    ///
    /// Each frame is windowed, transformed, and reduced to `|X[k]|²` for the
    /// `fft_size / 2 + 1` non-negative frequencies.
    pub fn power_spectrogram(&self, samples: &[f32], hop_size: usize, center: bool) -> Vec<Vec<f32>> {
        let frames = self.frame_count(samples.len(), hop_size, center);
        if frames == 0 {
            return Vec::new();
        }

        let padded;
        let signal: &[f32] = if center {
            let pad = self.fft_size / 2;
            let mut buffer = vec![0.0; samples.len() + 2 * pad];
            buffer[pad..pad + samples.len()].copy_from_slice(samples);
            padded = buffer;
            &padded
        } else {
            samples
        };

        let mut buffer = vec![Complex::new(0.0f32, 0.0); self.fft_size];
        let mut scratch = vec![Complex::new(0.0f32, 0.0); self.fft.get_inplace_scratch_len()];
        let bins = self.bin_count();

        (0..frames)
            .map(|frame| {
                let start = frame * hop_size;
                for (i, slot) in buffer.iter_mut().enumerate() {
                    let sample = signal.get(start + i).copied().unwrap_or(0.0);
                    *slot = Complex::new(sample * self.window[i], 0.0);
                }

                self.fft.process_with_scratch(&mut buffer, &mut scratch);

                buffer[..bins].iter().map(|c| c.norm_sqr()).collect()
            })
            .collect()
    }
}

/// Periodic Hann window of length `size`
fn hann_window(size: usize) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n).cos())
        .collect()
}
