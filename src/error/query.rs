// Query orchestration error types and constants

use crate::error::{CatalogError, ErrorCode, ExtractionError, RankingError};
use log::error;
use std::fmt;

/// Query error code constants
///
/// Wrapped extraction/ranking/catalog errors keep their own codes; the
/// constants below cover failures owned by the orchestrator.
///
/// Error code range: 4001-4008
pub struct QueryErrorCodes {}

impl QueryErrorCodes {
    /// No reference fingerprints are loaded
    pub const EMPTY_REFERENCE_SET: i32 = 4001;

    /// A directory passed to initialize does not exist
    pub const INVALID_DIRECTORY: i32 = 4002;

    /// Upload exceeds the configured size limit
    pub const UPLOAD_TOO_LARGE: i32 = 4003;

    /// Upload file extension not accepted
    pub const UNSUPPORTED_FORMAT: i32 = 4004;

    /// Reference identifier unknown
    pub const REFERENCE_NOT_FOUND: i32 = 4005;

    /// Decoding/extraction exceeded its time budget
    pub const DECODE_TIMEOUT: i32 = 4006;

    /// External similarity backend failed
    pub const BACKEND_FAILURE: i32 = 4007;

    /// Worker task panicked or was cancelled
    pub const INTERNAL: i32 = 4008;
}

/// Log a query error with structured context
pub fn log_query_error(err: &QueryError, context: &str) {
    error!(
        "Query error in {}: code={}, component=QueryService, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Orchestrator-level errors
#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    Extraction(ExtractionError),
    Ranking(RankingError),
    Catalog(CatalogError),

    /// Precondition failure: nothing has been loaded to compare against
    EmptyReferenceSet,

    InvalidDirectory { path: String },

    UploadTooLarge { size: usize, limit: usize },

    UnsupportedFormat { filename: String },

    ReferenceNotFound { identifier: String },

    DecodeTimeout { timeout_ms: u64 },

    BackendFailure { reason: String },

    Internal { reason: String },
}

impl QueryError {
    /// Whether the failure was caused by the caller's input rather than the service
    ///
    /// Unreadable query audio is a client error; an empty reference set is a
    /// precondition the caller must satisfy by initializing first.
    pub fn is_client_error(&self) -> bool {
        match self {
            QueryError::Extraction(err) => matches!(
                err,
                ExtractionError::Decode { .. }
                    | ExtractionError::EmptyAudio
                    | ExtractionError::UnsupportedCodec { .. }
            ),
            QueryError::Ranking(RankingError::UnsupportedMetric { .. }) => true,
            QueryError::Ranking(_) => false,
            QueryError::Catalog(_) => false,
            QueryError::EmptyReferenceSet
            | QueryError::InvalidDirectory { .. }
            | QueryError::UploadTooLarge { .. }
            | QueryError::UnsupportedFormat { .. }
            | QueryError::ReferenceNotFound { .. } => true,
            QueryError::DecodeTimeout { .. }
            | QueryError::BackendFailure { .. }
            | QueryError::Internal { .. } => false,
        }
    }
}

impl ErrorCode for QueryError {
    fn code(&self) -> i32 {
        match self {
            QueryError::Extraction(err) => err.code(),
            QueryError::Ranking(err) => err.code(),
            QueryError::Catalog(err) => err.code(),
            QueryError::EmptyReferenceSet => QueryErrorCodes::EMPTY_REFERENCE_SET,
            QueryError::InvalidDirectory { .. } => QueryErrorCodes::INVALID_DIRECTORY,
            QueryError::UploadTooLarge { .. } => QueryErrorCodes::UPLOAD_TOO_LARGE,
            QueryError::UnsupportedFormat { .. } => QueryErrorCodes::UNSUPPORTED_FORMAT,
            QueryError::ReferenceNotFound { .. } => QueryErrorCodes::REFERENCE_NOT_FOUND,
            QueryError::DecodeTimeout { .. } => QueryErrorCodes::DECODE_TIMEOUT,
            QueryError::BackendFailure { .. } => QueryErrorCodes::BACKEND_FAILURE,
            QueryError::Internal { .. } => QueryErrorCodes::INTERNAL,
        }
    }

    fn message(&self) -> String {
        match self {
            QueryError::Extraction(err) => err.message(),
            QueryError::Ranking(err) => err.message(),
            QueryError::Catalog(err) => err.message(),
            QueryError::EmptyReferenceSet => {
                "No reference files initialized. Call initialize first".to_string()
            }
            QueryError::InvalidDirectory { path } => format!("Invalid directory path: {}", path),
            QueryError::UploadTooLarge { size, limit } => {
                format!("File too large: {} bytes (limit {} bytes)", size, limit)
            }
            QueryError::UnsupportedFormat { filename } => {
                format!("Invalid file format: {}", filename)
            }
            QueryError::ReferenceNotFound { identifier } => {
                format!("Reference '{}' not found", identifier)
            }
            QueryError::DecodeTimeout { timeout_ms } => {
                format!("Fingerprinting did not finish within {} ms", timeout_ms)
            }
            QueryError::BackendFailure { reason } => {
                format!("Similarity backend failed: {}", reason)
            }
            QueryError::Internal { reason } => format!("Internal error: {}", reason),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Extraction(err) => write!(f, "{}", err),
            QueryError::Ranking(err) => write!(f, "{}", err),
            QueryError::Catalog(err) => write!(f, "{}", err),
            _ => write!(f, "QueryError (code {}): {}", self.code(), self.message()),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Extraction(err) => Some(err),
            QueryError::Ranking(err) => Some(err),
            QueryError::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ExtractionError> for QueryError {
    fn from(err: ExtractionError) -> Self {
        QueryError::Extraction(err)
    }
}

impl From<RankingError> for QueryError {
    fn from(err: RankingError) -> Self {
        QueryError::Ranking(err)
    }
}

impl From<CatalogError> for QueryError {
    fn from(err: CatalogError) -> Self {
        QueryError::Catalog(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_inner_code() {
        let err: QueryError = ExtractionError::EmptyAudio.into();
        assert_eq!(err.code(), 1002);

        let err: QueryError = RankingError::EmptyCandidateSet.into();
        assert_eq!(err.code(), 2003);
    }

    #[test]
    fn test_client_vs_server_classification() {
        let decode: QueryError = ExtractionError::Decode {
            reason: "garbage".to_string(),
        }
        .into();
        assert!(decode.is_client_error());
        assert!(QueryError::EmptyReferenceSet.is_client_error());
        assert!(QueryError::UploadTooLarge {
            size: 11,
            limit: 10
        }
        .is_client_error());

        assert!(!QueryError::DecodeTimeout { timeout_ms: 5 }.is_client_error());
        let mismatch: QueryError = RankingError::DimensionMismatch {
            identifier: "a".to_string(),
            expected: 13,
            actual: 12,
        }
        .into();
        assert!(!mismatch.is_client_error());
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), ExtractionError> {
            Err(ExtractionError::EmptyAudio)
        }

        fn caller() -> Result<(), QueryError> {
            may_fail()?;
            Ok(())
        }

        assert_eq!(
            caller(),
            Err(QueryError::Extraction(ExtractionError::EmptyAudio))
        );
    }
}
