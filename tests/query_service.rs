//! QueryService end-to-end: initialize from disk, analyze uploads, refresh

use std::fs;
use std::path::PathBuf;

use soundalike::config::AppConfig;
use soundalike::error::QueryError;
use soundalike::fixtures::{wav_bytes, write_wav, SyntheticPattern, SyntheticSpec};
use soundalike::service::{AnalyzeOptions, QueryService, Upload};

fn init_test_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build test runtime")
}

fn reference_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "soundalike-service-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();

    for (file, pattern, freq) in [
        ("low.wav", SyntheticPattern::Sine, 220.0),
        ("high.wav", SyntheticPattern::Sine, 1760.0),
        ("hiss.wav", SyntheticPattern::WhiteNoise, 0.0),
        ("buzz.wav", SyntheticPattern::Square, 110.0),
    ] {
        let samples = SyntheticSpec::new(pattern, freq).render(22_050, 0.5);
        write_wav(&dir.join(file), &samples, 22_050, 1).unwrap();
    }
    fs::write(dir.join("broken.ogg"), b"OggS but not really").unwrap();
    dir
}

fn upload(name: &str, pattern: SyntheticPattern, freq: f32) -> Upload {
    let samples = SyntheticSpec::new(pattern, freq).render(22_050, 0.5);
    Upload::new(name, wav_bytes(&samples, 22_050, 1).unwrap())
}

#[test]
fn test_initialize_and_analyze() {
    let dir = reference_dir("analyze");
    let service = QueryService::new(&AppConfig::default()).unwrap();

    let summary = service.initialize(&[&dir]).unwrap();
    assert_eq!(summary.num_files, 4);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].filename, "broken.ogg");

    let runtime = init_test_runtime();
    let report = runtime
        .block_on(service.analyze(
            upload("query.wav", SyntheticPattern::Sine, 220.0),
            AnalyzeOptions {
                threshold: Some(-1.0),
                limit: Some(2),
                metric: None,
            },
        ))
        .unwrap();

    assert_eq!(report.similar_files.len(), 2);
    assert_eq!(report.similar_files[0].filename, "low.wav");
    assert!(report.similar_files[0].similarity_score > 0.999_999);
    assert!(report.similar_files[0].distance <= report.similar_files[1].distance);
    assert_eq!(report.threshold, -1.0);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["similar_files"].is_array());
    assert_eq!(json["input_features"].as_array().unwrap().len(), 13);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_refresh_swaps_whole_catalog() {
    let dir = reference_dir("refresh");
    let service = QueryService::new(&AppConfig::default()).unwrap();
    service.initialize(&[&dir]).unwrap();

    let before = service.catalog().snapshot();
    fs::remove_file(dir.join("buzz.wav")).unwrap();
    service.initialize(&[&dir]).unwrap();

    // A snapshot taken before the refresh is untouched
    assert_eq!(before.len(), 4);
    assert_eq!(service.stats().total_reference_files, 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_empty_reference_set_is_distinct_from_no_matches() {
    let service = QueryService::new(&AppConfig::default()).unwrap();
    let runtime = init_test_runtime();

    let err = runtime
        .block_on(service.analyze(
            upload("q.wav", SyntheticPattern::Sine, 440.0),
            AnalyzeOptions::default(),
        ))
        .unwrap_err();
    assert_eq!(err, QueryError::EmptyReferenceSet);

    runtime
        .block_on(service.add_reference(upload("ref.wav", SyntheticPattern::Sine, 440.0)))
        .unwrap();
    let report = runtime
        .block_on(service.analyze(
            upload("q.wav", SyntheticPattern::Sine, 440.0),
            AnalyzeOptions {
                threshold: Some(1.01),
                ..Default::default()
            },
        ))
        .unwrap();
    assert!(report.similar_files.is_empty());
}

#[test]
fn test_configured_coefficients_flow_through() {
    let mut config = AppConfig::default();
    config.extraction.coefficient_count = 20;
    let service = QueryService::new(&config).unwrap();
    let runtime = init_test_runtime();

    runtime
        .block_on(service.add_reference(upload("ref.wav", SyntheticPattern::Square, 220.0)))
        .unwrap();
    assert_eq!(service.stats().feature_dimensions, 20);
}

#[test]
fn test_invalid_extraction_config_rejected() {
    let mut config = AppConfig::default();
    config.extraction.coefficient_count = 0;
    assert!(matches!(
        QueryService::new(&config),
        Err(QueryError::Extraction(_))
    ));
}
