// Catalog error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Catalog error code constants
///
/// Error code range: 3001-3003
pub struct CatalogErrorCodes {}

impl CatalogErrorCodes {
    /// The source as a whole could not be enumerated
    pub const SOURCE_UNAVAILABLE: i32 = 3001;

    /// A record disagrees with the collection's dimensionality
    pub const DIMENSION_MISMATCH: i32 = 3002;

    /// Two metadata rows share an identifier
    pub const DUPLICATE_IDENTIFIER: i32 = 3003;
}

/// Log a catalog error with structured context
pub fn log_catalog_error(err: &CatalogError, context: &str) {
    error!(
        "Catalog error in {}: code={}, component=FingerprintStore, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Fingerprint store errors
///
/// Per-item extraction failures never surface here; they are reported as
/// skipped items inside a batch report.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// Enumerating the source failed
    SourceUnavailable { reason: String },

    /// Record dimensionality inconsistent with the collection
    DimensionMismatch {
        identifier: String,
        expected: usize,
        actual: usize,
    },

    /// Identifier seen twice while building from rows
    DuplicateIdentifier { identifier: String },
}

impl ErrorCode for CatalogError {
    fn code(&self) -> i32 {
        match self {
            CatalogError::SourceUnavailable { .. } => CatalogErrorCodes::SOURCE_UNAVAILABLE,
            CatalogError::DimensionMismatch { .. } => CatalogErrorCodes::DIMENSION_MISMATCH,
            CatalogError::DuplicateIdentifier { .. } => CatalogErrorCodes::DUPLICATE_IDENTIFIER,
        }
    }

    fn message(&self) -> String {
        match self {
            CatalogError::SourceUnavailable { reason } => {
                format!("Catalog source unavailable: {}", reason)
            }
            CatalogError::DimensionMismatch {
                identifier,
                expected,
                actual,
            } => format!(
                "Record '{}' has {} dimensions but the collection holds {}",
                identifier, actual, expected
            ),
            CatalogError::DuplicateIdentifier { identifier } => {
                format!("Duplicate identifier '{}'", identifier)
            }
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            CatalogError::SourceUnavailable { .. } => "SourceUnavailable",
            CatalogError::DimensionMismatch { .. } => "DimensionMismatch",
            CatalogError::DuplicateIdentifier { .. } => "DuplicateIdentifier",
        };
        write!(
            f,
            "CatalogError::{} (code {}): {}",
            variant,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::SourceUnavailable {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_codes() {
        assert_eq!(
            CatalogError::SourceUnavailable {
                reason: "x".to_string()
            }
            .code(),
            3001
        );
        assert_eq!(
            CatalogError::DimensionMismatch {
                identifier: "a".to_string(),
                expected: 13,
                actual: 2
            }
            .code(),
            3002
        );
        assert_eq!(
            CatalogError::DuplicateIdentifier {
                identifier: "a".to_string()
            }
            .code(),
            3003
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such dir");
        let err: CatalogError = io_err.into();
        match err {
            CatalogError::SourceUnavailable { reason } => assert!(reason.contains("no such dir")),
            other => panic!("Expected SourceUnavailable, got {:?}", other),
        }
    }
}
