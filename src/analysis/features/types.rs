// Types module - fingerprint representation
//
// A fingerprint is the time-averaged MFCC vector of one clip. Its length is
// the configured coefficient count; fingerprints are only comparable when
// their lengths agree.

use serde::{Deserialize, Serialize};

/// Fixed-length spectral-timbre summary of a clip
///
/// Serialises as a plain JSON number array so rows from an external
/// metadata store can be deserialised directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(Vec<f32>);

impl Fingerprint {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Number of coefficients
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<Vec<f32>> for Fingerprint {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

impl AsRef<[f32]> for Fingerprint {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
