// Extraction error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Extraction error code constants
///
/// Error code range: 1001-1005
pub struct ExtractionErrorCodes {}

impl ExtractionErrorCodes {
    /// Source bytes could not be parsed as audio
    pub const DECODE: i32 = 1001;

    /// Waveform decoded to zero usable samples/frames
    pub const EMPTY_AUDIO: i32 = 1002;

    /// Source could not be read at all (missing file, permissions)
    pub const SOURCE_UNREADABLE: i32 = 1003;

    /// Extractor parameters are out of range
    pub const INVALID_PARAMETERS: i32 = 1004;

    /// Container was recognised but no decoder exists for its codec
    pub const UNSUPPORTED_CODEC: i32 = 1005;
}

/// Log an extraction error with structured context
pub fn log_extraction_error(err: &ExtractionError, context: &str) {
    error!(
        "Extraction error in {}: code={}, component=FeatureExtractor, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Feature-extraction errors
///
/// These cover everything between raw source bytes and a finished
/// fingerprint: reading, container probing, decoding and the MFCC pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Source is not decodable audio
    Decode { reason: String },

    /// Decoding produced no usable frames
    EmptyAudio,

    /// Source could not be opened or read
    SourceUnreadable { source: String, reason: String },

    /// Extractor configuration rejected
    InvalidParameters { reason: String },

    /// Codec has no decoder in this build
    UnsupportedCodec { reason: String },
}

impl ErrorCode for ExtractionError {
    fn code(&self) -> i32 {
        match self {
            ExtractionError::Decode { .. } => ExtractionErrorCodes::DECODE,
            ExtractionError::EmptyAudio => ExtractionErrorCodes::EMPTY_AUDIO,
            ExtractionError::SourceUnreadable { .. } => ExtractionErrorCodes::SOURCE_UNREADABLE,
            ExtractionError::InvalidParameters { .. } => ExtractionErrorCodes::INVALID_PARAMETERS,
            ExtractionError::UnsupportedCodec { .. } => ExtractionErrorCodes::UNSUPPORTED_CODEC,
        }
    }

    fn message(&self) -> String {
        match self {
            ExtractionError::Decode { reason } => format!("Failed to decode audio: {}", reason),
            ExtractionError::EmptyAudio => {
                "Audio contains no usable frames to fingerprint".to_string()
            }
            ExtractionError::SourceUnreadable { source, reason } => {
                format!("Cannot read audio source {}: {}", source, reason)
            }
            ExtractionError::InvalidParameters { reason } => {
                format!("Invalid extraction parameters: {}", reason)
            }
            ExtractionError::UnsupportedCodec { reason } => {
                format!("Unsupported codec: {}", reason)
            }
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExtractionError::{} (code {}): {}",
            self.variant_name(),
            self.code(),
            self.message()
        )
    }
}

impl ExtractionError {
    fn variant_name(&self) -> &'static str {
        match self {
            ExtractionError::Decode { .. } => "Decode",
            ExtractionError::EmptyAudio => "EmptyAudio",
            ExtractionError::SourceUnreadable { .. } => "SourceUnreadable",
            ExtractionError::InvalidParameters { .. } => "InvalidParameters",
            ExtractionError::UnsupportedCodec { .. } => "UnsupportedCodec",
        }
    }
}

impl std::error::Error for ExtractionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error_codes() {
        assert_eq!(
            ExtractionError::Decode {
                reason: "x".to_string()
            }
            .code(),
            1001
        );
        assert_eq!(ExtractionError::EmptyAudio.code(), 1002);
        assert_eq!(
            ExtractionError::SourceUnreadable {
                source: "a.wav".to_string(),
                reason: "missing".to_string()
            }
            .code(),
            1003
        );
        assert_eq!(
            ExtractionError::InvalidParameters {
                reason: "x".to_string()
            }
            .code(),
            1004
        );
        assert_eq!(
            ExtractionError::UnsupportedCodec {
                reason: "x".to_string()
            }
            .code(),
            1005
        );
    }

    #[test]
    fn test_display_includes_variant_and_code() {
        let err = ExtractionError::EmptyAudio;
        let rendered = err.to_string();
        assert!(rendered.starts_with("ExtractionError::EmptyAudio"));
        assert!(rendered.contains("code 1002"));
    }

    #[test]
    fn test_source_unreadable_message_names_source() {
        let err = ExtractionError::SourceUnreadable {
            source: "clips/kick.ogg".to_string(),
            reason: "No such file".to_string(),
        };
        assert!(err.message().contains("clips/kick.ogg"));
    }
}
