//! Configuration management for extraction and query parameters
//!
//! This module provides runtime configuration loading from JSON files so
//! MFCC parameters, catalog filters and query defaults can be tuned without
//! recompilation. Every section falls back to its defaults field by field.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ExtractionError;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extraction: ExtractionConfig,
    pub catalog: CatalogConfig,
    pub query: QueryConfig,
}

/// MFCC fingerprint parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Fingerprint dimensionality
    pub coefficient_count: usize,
    /// STFT window size in samples
    pub fft_size: usize,
    /// Hop between successive frames
    pub hop_size: usize,
    /// Number of triangular mel filters
    pub mel_bands: usize,
    /// Lowest filter edge in Hz
    pub min_frequency_hz: f32,
    /// Highest filter edge in Hz (Nyquist when unset)
    pub max_frequency_hz: Option<f32>,
    /// Zero-pad half a window on both sides before framing
    pub center: bool,
    /// Dynamic range kept below the loudest mel bin, in dB
    pub top_db: Option<f32>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            coefficient_count: 13,
            fft_size: 2048,
            hop_size: 512,
            mel_bands: 128,
            min_frequency_hz: 0.0,
            max_frequency_hz: None,
            center: true,
            top_db: Some(80.0),
        }
    }
}

impl ExtractionConfig {
    /// Default parameters with a different fingerprint dimensionality
    pub fn with_coefficients(coefficient_count: usize) -> Self {
        Self {
            coefficient_count,
            ..Self::default()
        }
    }

    /// Reject parameter combinations the pipeline cannot honour
    pub fn validate(&self) -> Result<(), ExtractionError> {
        let invalid = |reason: String| Err(ExtractionError::InvalidParameters { reason });

        if self.coefficient_count == 0 {
            return invalid("coefficient_count must be at least 1".to_string());
        }
        if self.mel_bands == 0 {
            return invalid("mel_bands must be at least 1".to_string());
        }
        if self.coefficient_count > self.mel_bands {
            return invalid(format!(
                "coefficient_count ({}) cannot exceed mel_bands ({})",
                self.coefficient_count, self.mel_bands
            ));
        }
        if self.fft_size < 2 {
            return invalid(format!("fft_size must be at least 2 (got {})", self.fft_size));
        }
        if self.hop_size == 0 {
            return invalid("hop_size must be at least 1".to_string());
        }
        if !self.min_frequency_hz.is_finite() || self.min_frequency_hz < 0.0 {
            return invalid(format!(
                "min_frequency_hz must be non-negative (got {})",
                self.min_frequency_hz
            ));
        }
        if let Some(max) = self.max_frequency_hz {
            if !max.is_finite() || max <= self.min_frequency_hz {
                return invalid(format!(
                    "max_frequency_hz ({}) must exceed min_frequency_hz ({})",
                    max, self.min_frequency_hz
                ));
            }
        }
        if let Some(top_db) = self.top_db {
            if !top_db.is_finite() || top_db < 0.0 {
                return invalid(format!("top_db must be non-negative (got {})", top_db));
            }
        }
        Ok(())
    }
}

/// Reference catalog scanning options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// File-name suffixes that qualify for fingerprinting
    pub extensions: Vec<String>,
    /// Descend into sub-directories
    pub recursive: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".ogg".to_string(), ".wav".to_string(), ".mp3".to_string()],
            recursive: false,
        }
    }
}

/// Query defaults and upload limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Minimum similarity (1 - distance) a match needs to be returned
    pub similarity_threshold: f64,
    /// Maximum number of matches returned
    pub limit: usize,
    /// Distance metric name
    pub metric: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Time budget for decoding + extracting one upload
    pub decode_timeout_ms: u64,
    /// Matches returned per file by batch analysis and reference details
    pub neighbours: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            limit: 10,
            metric: "cosine".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            decode_timeout_ms: 30_000,
            neighbours: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The parsed configuration, or defaults when the file is missing or
    /// the JSON is invalid (a warning is logged in both cases).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load from `SOUNDALIKE_CONFIG` if set, otherwise `soundalike.json`
    pub fn load() -> Self {
        let path =
            std::env::var("SOUNDALIKE_CONFIG").unwrap_or_else(|_| "soundalike.json".to_string());
        Self::load_from_file(path)
    }
}
