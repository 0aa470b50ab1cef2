//! Distance functions over equal-length fingerprints.
//!
//! Every metric follows "lower = more similar". Distances are accumulated in
//! `f64` regardless of the `f32` storage of fingerprints.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RankingError;

/// Pairwise distance between two vectors of identical length
///
/// Implementations may be asymmetric; they must never return NaN so the
/// ranking order stays total.
pub trait DistanceMetric: Send + Sync {
    /// Name reported alongside rankings
    fn name(&self) -> &str;

    /// Distance between `a` and `b`; callers guarantee `a.len() == b.len()`
    fn distance(&self, a: &[f32], b: &[f32]) -> f64;
}

/// Built-in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// `1 − cos θ`, in [0, 2]
    #[default]
    Cosine,
    /// L2 distance
    Euclidean,
    /// L1 distance
    Manhattan,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = RankingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            "manhattan" | "cityblock" | "l1" => Ok(Metric::Manhattan),
            _ => Err(RankingError::UnsupportedMetric {
                name: value.to_string(),
            }),
        }
    }
}

impl DistanceMetric for Metric {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        match self {
            Metric::Cosine => cosine_distance(a, b),
            Metric::Euclidean => euclidean_distance(a, b),
            Metric::Manhattan => manhattan_distance(a, b),
        }
    }
}

/// Cosine distance; a zero-norm operand counts as orthogonal (distance 1)
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    let distance = 1.0 - dot / (norm_a * norm_b).sqrt();
    if distance.is_nan() {
        return 1.0;
    }
    distance.clamp(0.0, 2.0)
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

pub fn manhattan_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x as f64 - y as f64).abs())
        .sum()
}
