// Soundalike Core - audio clip similarity search
// MFCC fingerprints, batch catalog loading and deterministic nearest-clip ranking

// Module declarations
pub mod analysis;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod ranking;
pub mod service;

// Re-exports for convenience
pub use analysis::{extract, Fingerprint, MfccExtractor};
pub use audio::{AudioSource, Waveform};
pub use catalog::{
    load_all, BatchReport, CatalogHandle, DirectorySource, ExtensionFilter, FingerprintCollection,
    ReferenceRecord, StorageRef,
};
pub use config::AppConfig;
pub use ranking::{rank, rank_fingerprint, rank_top_k, DistanceMetric, Metric, RankedMatch, Ranking};
pub use service::QueryService;

use tracing::Level;

/// Install a stderr fmt subscriber at `level`
///
/// `log` records from dependencies are forwarded through the same
/// subscriber. Calling this twice is harmless; the second call is ignored.
pub fn init_logging(level: Level) {
    let installed = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if installed.is_ok() {
        log::debug!("[Soundalike] Logging initialized at {}", level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(Level::WARN);
        init_logging(Level::DEBUG);
    }

    #[test]
    fn test_end_to_end_ranking_of_synthetic_clips() {
        use crate::fixtures::{wav_bytes, SyntheticPattern, SyntheticSpec};

        let extractor = MfccExtractor::with_coefficients(13).unwrap();
        let mut collection = FingerprintCollection::new();
        for (name, spec) in [
            ("tone_a.wav", SyntheticSpec::new(SyntheticPattern::Sine, 440.0)),
            ("tone_b.wav", SyntheticSpec::new(SyntheticPattern::Sine, 450.0)),
            ("noise.wav", SyntheticSpec::new(SyntheticPattern::WhiteNoise, 0.0)),
        ] {
            let bytes = wav_bytes(&spec.render(22_050, 0.5), 22_050, 1).unwrap();
            let fingerprint = extractor
                .extract(&AudioSource::from_upload(bytes, name))
                .unwrap();
            collection.insert(ReferenceRecord::new(name, fingerprint));
        }

        let ranking = rank("tone_a.wav", &collection, &Metric::Cosine).unwrap();
        assert_eq!(ranking.identifiers(), vec!["tone_b.wav", "noise.wav"]);
    }
}
