// Mel module - triangular mel filterbank on the Slaney scale
//
// The scale is linear below 1 kHz and logarithmic above it. Filters are
// area-normalised (each triangle scaled by 2 / bandwidth) so wide high
// frequency bands do not dominate the energy sum. Filter placement depends on
// the sample rate, which is why a bank is built per decoded rate.
//
// References:
// - Slaney, M. (1998). Auditory Toolbox, Technical Report #1998-010

const F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / F_SP;

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

/// Convert Hz to mels (Slaney)
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / F_SP
    }
}

/// Convert mels to Hz (Slaney)
pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * F_SP
    }
}

/// One triangular filter stored sparsely from its first non-zero bin
#[derive(Debug, Clone)]
struct MelFilter {
    start_bin: usize,
    weights: Vec<f32>,
}

/// Mel filterbank mapping a power spectrum onto `mel_bands` energies
#[derive(Debug, Clone)]
pub struct MelFilterBank {
    filters: Vec<MelFilter>,
    bin_count: usize,
    sample_rate: u32,
}

impl MelFilterBank {
    /// Build a filterbank
    ///
    /// # Arguments
    /// * `sample_rate` - Decoded sample rate in Hz
    /// * `fft_size` - FFT size the spectra were computed with
    /// * `mel_bands` - Number of filters
    /// * `min_hz` / `max_hz` - Edge frequencies (max is clamped to Nyquist)
    pub fn new(sample_rate: u32, fft_size: usize, mel_bands: usize, min_hz: f32, max_hz: f32) -> Self {
        let bin_count = fft_size / 2 + 1;
        let nyquist = sample_rate as f64 / 2.0;
        let max_hz = (max_hz as f64).min(nyquist);
        let min_hz = (min_hz as f64).min(max_hz);

        let fft_freqs: Vec<f64> = (0..bin_count)
            .map(|bin| bin as f64 * sample_rate as f64 / fft_size as f64)
            .collect();

        let min_mel = hz_to_mel(min_hz);
        let max_mel = hz_to_mel(max_hz);
        let edges: Vec<f64> = (0..mel_bands + 2)
            .map(|i| {
                let mel = min_mel + (max_mel - min_mel) * i as f64 / (mel_bands + 1) as f64;
                mel_to_hz(mel)
            })
            .collect();

        let filters = (0..mel_bands)
            .map(|band| {
                let (lower, center, upper) = (edges[band], edges[band + 1], edges[band + 2]);
                let rising = center - lower;
                let falling = upper - center;
                let enorm = if upper > lower { 2.0 / (upper - lower) } else { 0.0 };

                let dense: Vec<f64> = fft_freqs
                    .iter()
                    .map(|&freq| {
                        let up = if rising > 0.0 { (freq - lower) / rising } else { 0.0 };
                        let down = if falling > 0.0 { (upper - freq) / falling } else { 0.0 };
                        up.min(down).max(0.0) * enorm
                    })
                    .collect();

                match dense.iter().position(|&w| w > 0.0) {
                    Some(start_bin) => {
                        let end = dense.iter().rposition(|&w| w > 0.0).unwrap_or(start_bin);
                        MelFilter {
                            start_bin,
                            weights: dense[start_bin..=end].iter().map(|&w| w as f32).collect(),
                        }
                    }
                    None => MelFilter {
                        start_bin: 0,
                        weights: Vec::new(),
                    },
                }
            })
            .collect();

        Self {
            filters,
            bin_count,
            sample_rate,
        }
    }

    pub fn band_count(&self) -> usize {
        self.filters.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bands whose triangle falls between two FFT bins and never fires
    pub fn empty_band_count(&self) -> usize {
        self.filters.iter().filter(|f| f.weights.is_empty()).count()
    }

    /// Apply the bank to one power spectrum
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        debug_assert_eq!(power.len(), self.bin_count);

        self.filters
            .iter()
            .map(|filter| {
                filter
                    .weights
                    .iter()
                    .zip(power.iter().skip(filter.start_bin))
                    .map(|(&w, &p)| w * p)
                    .sum()
            })
            .collect()
    }

    #[cfg(test)]
    fn peak_bin(&self, band: usize) -> Option<usize> {
        let filter = &self.filters[band];
        filter
            .weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(offset, _)| filter.start_bin + offset)
    }
}
