//! Audio input boundary.
//!
//! Callers hand the extractor either a path or an in-memory byte buffer;
//! both are normalised into a mono [`Waveform`] at the clip's native sample
//! rate before any analysis happens.

mod decode;

pub use decode::{decode, downmix};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ExtractionError;

/// Where the bytes of a clip come from
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// A file on local disk
    Path(PathBuf),
    /// An uploaded or fetched buffer; `extension` helps format probing
    Bytes {
        data: Arc<[u8]>,
        extension: Option<String>,
    },
}

impl AudioSource {
    pub fn path<P: Into<PathBuf>>(path: P) -> Self {
        AudioSource::Path(path.into())
    }

    pub fn bytes<D: Into<Arc<[u8]>>>(data: D, extension: Option<&str>) -> Self {
        AudioSource::Bytes {
            data: data.into(),
            extension: extension.map(|ext| ext.trim_start_matches('.').to_ascii_lowercase()),
        }
    }

    /// Build a byte source, deriving the probe hint from an upload's file name
    pub fn from_upload<D: Into<Arc<[u8]>>>(data: D, filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str());
        Self::bytes(data, extension)
    }

    /// File extension used as a container hint, lowercase without the dot
    pub fn extension_hint(&self) -> Option<String> {
        match self {
            AudioSource::Path(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.to_ascii_lowercase()),
            AudioSource::Bytes { extension, .. } => extension.clone(),
        }
    }

    /// Short label for log lines and error messages
    pub fn describe(&self) -> String {
        match self {
            AudioSource::Path(path) => path.display().to_string(),
            AudioSource::Bytes { data, extension } => match extension {
                Some(ext) => format!("<{} bytes, .{}>", data.len(), ext),
                None => format!("<{} bytes>", data.len()),
            },
        }
    }
}

/// Decoded mono samples plus their sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, ExtractionError> {
        if sample_rate == 0 {
            return Err(ExtractionError::Decode {
                reason: "sample rate must be greater than 0".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
