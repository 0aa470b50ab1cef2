// DCT module - orthonormal type-II discrete cosine transform
//
// Decorrelates log-mel energies into cepstral coefficients. Only the first
// `output_len` coefficients are ever needed, so the basis is truncated.

/// Pre-computed DCT-II basis with orthonormal scaling
pub struct Dct2 {
    basis: Vec<Vec<f32>>,
    input_len: usize,
}

impl Dct2 {
    /// # Arguments
    /// * `input_len` - Length of each input vector (mel band count)
    /// * `output_len` - Number of leading coefficients to produce (≤ input_len)
    pub fn new(input_len: usize, output_len: usize) -> Self {
        let n = input_len as f64;
        let basis = (0..output_len.min(input_len))
            .map(|k| {
                let scale = if k == 0 {
                    (1.0 / n).sqrt()
                } else {
                    (2.0 / n).sqrt()
                };
                (0..input_len)
                    .map(|i| {
                        let angle = std::f64::consts::PI * k as f64 * (2.0 * i as f64 + 1.0)
                            / (2.0 * n);
                        (scale * angle.cos()) as f32
                    })
                    .collect()
            })
            .collect();

        Self { basis, input_len }
    }

    pub fn output_len(&self) -> usize {
        self.basis.len()
    }

    /// Transform one vector
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        debug_assert_eq!(input.len(), self.input_len);

        self.basis
            .iter()
            .map(|row| row.iter().zip(input).map(|(&b, &x)| b * x).sum())
            .collect()
    }
}
