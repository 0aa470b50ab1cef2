// Service request and response types
//
// Responses serialize to the JSON shapes the CLI prints; field names follow
// the reference-file service they replace (filename, similar_files, ...).

use std::sync::Arc;

use serde::Serialize;

use crate::audio::AudioSource;
use crate::catalog::{SkippedItem, StorageRef};
use crate::error::ErrorCode;
use crate::ranking::{RankedMatch, Ranking};

/// An uploaded clip: client-supplied file name plus raw bytes
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Arc<[u8]>,
}

impl Upload {
    pub fn new<S, D>(filename: S, data: D) -> Self
    where
        S: Into<String>,
        D: Into<Arc<[u8]>>,
    {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_source(&self) -> AudioSource {
        AudioSource::from_upload(Arc::clone(&self.data), &self.filename)
    }
}

/// Per-request overrides of the configured query defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzeOptions {
    /// Minimum similarity (1 − distance)
    pub threshold: Option<f64>,
    pub limit: Option<usize>,
    pub metric: Option<String>,
}

/// A match as reported to callers, carrying both distance and similarity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarFile {
    pub filename: String,
    pub distance: f64,
    pub similarity_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<StorageRef>,
}

impl From<&RankedMatch> for SimilarFile {
    fn from(m: &RankedMatch) -> Self {
        Self {
            filename: m.identifier.clone(),
            distance: m.distance,
            similarity_score: m.similarity(),
            storage_ref: m.storage_ref.clone(),
        }
    }
}

pub(crate) fn similar_files(ranking: &Ranking) -> Vec<SimilarFile> {
    ranking.matches().iter().map(SimilarFile::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Empty when nothing clears the threshold; that is not an error
    pub similar_files: Vec<SimilarFile>,
    pub analysis_time_ms: f64,
    pub input_features: Vec<f32>,
    pub threshold: f64,
    pub metric: String,
}

/// Numeric code plus message, for failures reported inline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub code: i32,
    pub message: String,
}

impl ErrorReport {
    pub fn from_error<E: ErrorCode>(err: &E) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub filename: String,
    #[serde(flatten)]
    pub error: ErrorReport,
}

impl From<&SkippedItem> for SkippedFile {
    fn from(item: &SkippedItem) -> Self {
        Self {
            filename: item.identifier.clone(),
            error: ErrorReport::from_error(&item.reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitializeSummary {
    pub num_files: usize,
    pub skipped: Vec<SkippedFile>,
    pub directories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub filename: String,
    pub similar_files: Vec<SimilarFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchAnalysis {
    pub results: Vec<BatchItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSummary {
    pub filename: String,
    pub dimensions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<StorageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceDetails {
    pub filename: String,
    pub features: Vec<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<StorageRef>,
    pub similar_files: Vec<SimilarFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_reference_files: usize,
    pub feature_dimensions: usize,
}
