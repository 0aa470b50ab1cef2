// Error types for the soundalike crate
//
// This module defines one error enum per concern (extraction, ranking,
// catalog loading, query orchestration). Every enum carries a stable numeric
// code so callers translating errors into responses can match on numbers
// instead of message text.

mod catalog;
mod extraction;
mod query;
mod ranking;

pub use catalog::{log_catalog_error, CatalogError, CatalogErrorCodes};
pub use extraction::{log_extraction_error, ExtractionError, ExtractionErrorCodes};
pub use query::{log_query_error, QueryError, QueryErrorCodes};
pub use ranking::{log_ranking_error, RankingError, RankingErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling at the
/// boundary with the orchestrating layer.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
