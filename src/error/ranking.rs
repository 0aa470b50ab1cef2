// Ranking error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Ranking error code constants
///
/// Error code range: 2001-2004
pub struct RankingErrorCodes {}

impl RankingErrorCodes {
    /// Query identifier is not a key of the candidate collection
    pub const UNKNOWN_QUERY: i32 = 2001;

    /// A candidate fingerprint has a different length than the query
    pub const DIMENSION_MISMATCH: i32 = 2002;

    /// Nothing to rank against
    pub const EMPTY_CANDIDATE_SET: i32 = 2003;

    /// Metric name not recognised
    pub const UNSUPPORTED_METRIC: i32 = 2004;
}

/// Log a ranking error with structured context
pub fn log_ranking_error(err: &RankingError, context: &str) {
    error!(
        "Ranking error in {}: code={}, component=SimilarityRanker, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Similarity-ranking errors
#[derive(Debug, Clone, PartialEq)]
pub enum RankingError {
    /// Query id absent from the collection
    UnknownQuery { query_id: String },

    /// Fingerprint lengths differ
    DimensionMismatch {
        identifier: String,
        expected: usize,
        actual: usize,
    },

    /// Candidate set is empty (raised only by callers that opt in)
    EmptyCandidateSet,

    /// Metric name could not be parsed
    UnsupportedMetric { name: String },
}

impl ErrorCode for RankingError {
    fn code(&self) -> i32 {
        match self {
            RankingError::UnknownQuery { .. } => RankingErrorCodes::UNKNOWN_QUERY,
            RankingError::DimensionMismatch { .. } => RankingErrorCodes::DIMENSION_MISMATCH,
            RankingError::EmptyCandidateSet => RankingErrorCodes::EMPTY_CANDIDATE_SET,
            RankingError::UnsupportedMetric { .. } => RankingErrorCodes::UNSUPPORTED_METRIC,
        }
    }

    fn message(&self) -> String {
        match self {
            RankingError::UnknownQuery { query_id } => {
                format!("Query '{}' is not in the candidate collection", query_id)
            }
            RankingError::DimensionMismatch {
                identifier,
                expected,
                actual,
            } => format!(
                "Fingerprint '{}' has {} dimensions, expected {}",
                identifier, actual, expected
            ),
            RankingError::EmptyCandidateSet => "No candidates to rank against".to_string(),
            RankingError::UnsupportedMetric { name } => {
                format!(
                    "Unsupported metric '{}' (expected cosine, euclidean or manhattan)",
                    name
                )
            }
        }
    }
}

impl fmt::Display for RankingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            RankingError::UnknownQuery { .. } => "UnknownQuery",
            RankingError::DimensionMismatch { .. } => "DimensionMismatch",
            RankingError::EmptyCandidateSet => "EmptyCandidateSet",
            RankingError::UnsupportedMetric { .. } => "UnsupportedMetric",
        };
        write!(
            f,
            "RankingError::{} (code {}): {}",
            variant,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for RankingError {}
