//! Ranking properties over hand-built fingerprint collections
//!
//! These tests exercise the public ranking API only:
//! - self-exclusion and cardinality
//! - non-decreasing distance order with lexical tie-breaks
//! - unknown-query and dimension-mismatch errors
//! - top-k agreement with the full ordering

use soundalike::error::{ErrorCode, RankingError};
use soundalike::ranking::{cosine_distance, rank, rank_fingerprint, rank_top_k, Metric};
use soundalike::{Fingerprint, FingerprintCollection, ReferenceRecord};

fn collection_of(entries: Vec<(String, Vec<f32>)>) -> FingerprintCollection {
    let mut collection = FingerprintCollection::new();
    for (id, values) in entries {
        collection.insert(ReferenceRecord::new(id, Fingerprint::new(values)));
    }
    collection
}

/// Pseudo-random but reproducible vectors without pulling in a RNG
fn lcg_vectors(count: usize, dims: usize) -> Vec<(String, Vec<f32>)> {
    let mut state: u32 = 0x1234_5678;
    (0..count)
        .map(|i| {
            let values = (0..dims)
                .map(|_| {
                    state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    (state >> 8) as f32 / (1u32 << 24) as f32 - 0.5
                })
                .collect();
            (format!("ref_{:03}", i), values)
        })
        .collect()
}

#[test]
fn test_three_reference_scenario() {
    let collection = collection_of(vec![
        ("Q".to_string(), vec![0.0, 1.0]),
        ("A".to_string(), vec![0.0, 1.0]),
        ("B".to_string(), vec![1.0, 0.0]),
        ("C".to_string(), vec![0.0, 1.0]),
    ]);

    let ranking = rank("Q", &collection, &Metric::Cosine).unwrap();
    let pairs: Vec<(&str, f64)> = ranking
        .matches()
        .iter()
        .map(|m| (m.identifier.as_str(), m.distance))
        .collect();

    assert_eq!(pairs, vec![("A", 0.0), ("C", 0.0), ("B", 1.0)]);
}

#[test]
fn test_self_exclusion_cardinality_and_order() {
    let collection = collection_of(lcg_vectors(60, 13));

    for query in ["ref_000", "ref_031", "ref_059"] {
        let ranking = rank(query, &collection, &Metric::Cosine).unwrap();

        assert_eq!(ranking.len(), collection.len() - 1);
        assert!(ranking.matches().iter().all(|m| m.identifier != query));
        for pair in ranking.matches().windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
            if pair[0].distance == pair[1].distance {
                assert!(pair[0].identifier < pair[1].identifier);
            }
        }
    }
}

#[test]
fn test_ties_are_reproducible_across_runs() {
    let mut entries = Vec::new();
    for name in ["delta", "alpha", "charlie", "bravo", "echo"] {
        entries.push((name.to_string(), vec![3.0, 4.0]));
    }
    entries.push(("query".to_string(), vec![3.0, 4.0]));
    let collection = collection_of(entries);

    let first = rank("query", &collection, &Metric::Cosine).unwrap();
    assert_eq!(
        first.identifiers(),
        vec!["alpha", "bravo", "charlie", "delta", "echo"]
    );
    for _ in 0..10 {
        let again = rank("query", &collection.clone(), &Metric::Cosine).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn test_identical_copy_has_zero_distance() {
    for (_, values) in lcg_vectors(20, 13) {
        assert_eq!(cosine_distance(&values, &values.clone()), 0.0);
    }
}

#[test]
fn test_unknown_query_error() {
    let collection = collection_of(vec![("a".to_string(), vec![1.0, 2.0])]);
    let err = rank("missing_id", &collection, &Metric::Cosine).unwrap_err();

    assert_eq!(
        err,
        RankingError::UnknownQuery {
            query_id: "missing_id".to_string()
        }
    );
    assert_eq!(err.code(), 2001);
}

#[test]
fn test_dimension_mismatch_error() {
    let collection = collection_of(vec![
        ("q".to_string(), vec![1.0, 2.0, 3.0]),
        ("c".to_string(), vec![1.0, 2.0]),
    ]);
    let err = rank("q", &collection, &Metric::Cosine).unwrap_err();

    assert_eq!(
        err,
        RankingError::DimensionMismatch {
            identifier: "c".to_string(),
            expected: 3,
            actual: 2
        }
    );
    assert_eq!(err.code(), 2002);
}

#[test]
fn test_only_query_yields_empty_ranking() {
    let collection = collection_of(vec![("q".to_string(), vec![1.0])]);
    assert!(rank("q", &collection, &Metric::Cosine).unwrap().is_empty());
}

#[test]
fn test_top_k_is_prefix_of_full_ordering_for_every_metric() {
    // Enough candidates to cross the parallel scoring threshold
    let collection = collection_of(lcg_vectors(2_500, 8));
    let query = Fingerprint::new(vec![0.1, -0.2, 0.3, 0.0, 0.05, -0.4, 0.2, 0.1]);

    for metric in [Metric::Cosine, Metric::Euclidean, Metric::Manhattan] {
        let full = rank_fingerprint(&query, &collection, &metric).unwrap();
        assert_eq!(full.len(), 2_500);

        let top = rank_top_k(&query, &collection, &metric, 25).unwrap();
        assert_eq!(top.matches(), &full.matches()[..25]);
        assert_eq!(top.metric(), metric.as_str());
    }
}

#[test]
fn test_threshold_filter_keeps_similar_prefix() {
    let collection = collection_of(vec![
        ("same".to_string(), vec![1.0, 0.0]),
        ("close".to_string(), vec![1.0, 0.1]),
        ("far".to_string(), vec![0.0, 1.0]),
    ]);
    let query = Fingerprint::new(vec![1.0, 0.0]);

    let ranking = rank_fingerprint(&query, &collection, &Metric::Cosine)
        .unwrap()
        .filter(Some(0.8), Some(10));
    assert_eq!(ranking.identifiers(), vec!["same", "close"]);
    assert!(ranking.matches().iter().all(|m| m.similarity() >= 0.8));
}
