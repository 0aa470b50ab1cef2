// Ranking module - nearest-fingerprint ordering
//
// Ranking is a pure function of a query fingerprint, a candidate collection
// and a distance metric. Distances are computed independently per candidate
// (in parallel above a size threshold) and then sorted by the total order
// (distance, identifier), so equal distances always come out in lexical
// identifier order.

pub mod metric;

pub use metric::{cosine_distance, euclidean_distance, manhattan_distance, DistanceMetric, Metric};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::analysis::Fingerprint;
use crate::catalog::{FingerprintCollection, ReferenceRecord, StorageRef};
use crate::error::RankingError;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Candidate count above which distances are computed on the rayon pool
#[cfg(feature = "parallel")]
const PAR_THRESHOLD: usize = 2_000;

/// One ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub identifier: String,
    /// Metric distance, lower is more similar
    pub distance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<StorageRef>,
}

impl RankedMatch {
    /// `1 − distance`; higher is more similar
    pub fn similarity(&self) -> f64 {
        1.0 - self.distance
    }
}

/// Ordered ranking result, ascending by distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    metric: String,
    matches: Vec<RankedMatch>,
}

impl Ranking {
    /// Wrap matches already sorted by the caller (e.g. an external index)
    pub fn new<S: Into<String>>(metric: S, matches: Vec<RankedMatch>) -> Self {
        Self {
            metric: metric.into(),
            matches,
        }
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn matches(&self) -> &[RankedMatch] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<RankedMatch> {
        self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.identifier.as_str()).collect()
    }

    /// Keep matches with `similarity ≥ threshold`, then at most `limit`
    pub fn filter(mut self, threshold: Option<f64>, limit: Option<usize>) -> Self {
        if let Some(threshold) = threshold {
            self.matches.retain(|m| m.similarity() >= threshold);
        }
        if let Some(limit) = limit {
            self.matches.truncate(limit);
        }
        self
    }

    /// Treat an empty ranking as an error, for callers that need a match
    pub fn require_non_empty(self) -> Result<Self, RankingError> {
        if self.matches.is_empty() {
            return Err(RankingError::EmptyCandidateSet);
        }
        Ok(self)
    }
}

/// Rank every other entry of `collection` against the entry keyed `query_id`
///
/// The query itself never appears in the output, so the result holds
/// `collection.len() - 1` matches.
///
/// # Errors
/// * `UnknownQuery` when `query_id` is not a key of `collection`
/// * `DimensionMismatch` when any candidate length differs from the query's
pub fn rank(
    query_id: &str,
    collection: &FingerprintCollection,
    metric: &dyn DistanceMetric,
) -> Result<Ranking, RankingError> {
    let query = collection
        .fingerprint(query_id)
        .ok_or_else(|| RankingError::UnknownQuery {
            query_id: query_id.to_string(),
        })?;

    let mut matches = score_candidates(query, collection, Some(query_id), metric)?;
    matches.sort_by(by_distance_then_identifier);

    tracing::debug!(
        "[Ranker] Ranked {} candidates against '{}' ({})",
        matches.len(),
        query_id,
        metric.name()
    );

    Ok(Ranking::new(metric.name(), matches))
}

/// Rank every entry of `collection` against an external query fingerprint
pub fn rank_fingerprint(
    query: &Fingerprint,
    collection: &FingerprintCollection,
    metric: &dyn DistanceMetric,
) -> Result<Ranking, RankingError> {
    let mut matches = score_candidates(query, collection, None, metric)?;
    matches.sort_by(by_distance_then_identifier);

    tracing::debug!(
        "[Ranker] Ranked {} candidates against external query ({})",
        matches.len(),
        metric.name()
    );

    Ok(Ranking::new(metric.name(), matches))
}

/// First `k` entries of [`rank_fingerprint`] without sorting the whole set
pub fn rank_top_k(
    query: &Fingerprint,
    collection: &FingerprintCollection,
    metric: &dyn DistanceMetric,
    k: usize,
) -> Result<Ranking, RankingError> {
    let mut matches = score_candidates(query, collection, None, metric)?;

    if k == 0 {
        matches.clear();
    } else if k < matches.len() {
        matches.select_nth_unstable_by(k - 1, by_distance_then_identifier);
        matches.truncate(k);
    }
    matches.sort_by(by_distance_then_identifier);

    Ok(Ranking::new(metric.name(), matches))
}

fn by_distance_then_identifier(a: &RankedMatch, b: &RankedMatch) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| a.identifier.cmp(&b.identifier))
}

fn score_candidates(
    query: &Fingerprint,
    collection: &FingerprintCollection,
    exclude: Option<&str>,
    metric: &dyn DistanceMetric,
) -> Result<Vec<RankedMatch>, RankingError> {
    let expected = query.dimension();
    let candidates: Vec<&ReferenceRecord> = collection
        .records()
        .filter(|record| Some(record.identifier.as_str()) != exclude)
        .collect();

    // Report the lexically smallest offender so the error is reproducible
    if let Some(bad) = candidates
        .iter()
        .filter(|record| record.fingerprint.dimension() != expected)
        .min_by(|a, b| a.identifier.cmp(&b.identifier))
    {
        return Err(RankingError::DimensionMismatch {
            identifier: bad.identifier.clone(),
            expected,
            actual: bad.fingerprint.dimension(),
        });
    }

    let query = query.as_slice();
    let score = |record: &&ReferenceRecord| RankedMatch {
        identifier: record.identifier.clone(),
        distance: metric.distance(query, record.fingerprint.as_slice()),
        storage_ref: record.storage_ref.clone(),
    };

    Ok(map_candidates(&candidates, score))
}

#[cfg(feature = "parallel")]
fn map_candidates<F>(candidates: &[&ReferenceRecord], score: F) -> Vec<RankedMatch>
where
    F: Fn(&&ReferenceRecord) -> RankedMatch + Send + Sync,
{
    if candidates.len() >= PAR_THRESHOLD {
        candidates.par_iter().map(score).collect()
    } else {
        candidates.iter().map(score).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn map_candidates<F>(candidates: &[&ReferenceRecord], score: F) -> Vec<RankedMatch>
where
    F: Fn(&&ReferenceRecord) -> RankedMatch,
{
    candidates.iter().map(score).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(entries: &[(&str, &[f32])]) -> FingerprintCollection {
        let mut collection = FingerprintCollection::new();
        for (id, values) in entries {
            collection.insert(ReferenceRecord::new(*id, Fingerprint::new(values.to_vec())));
        }
        collection
    }

    #[test]
    fn test_rank_excludes_query_and_sorts() {
        let c = collection(&[
            ("q", &[0.0, 1.0]),
            ("a", &[0.0, 1.0]),
            ("b", &[1.0, 0.0]),
            ("c", &[0.0, 1.0]),
        ]);

        let ranking = rank("q", &c, &Metric::Cosine).unwrap();
        assert_eq!(ranking.identifiers(), vec!["a", "c", "b"]);
        assert_eq!(ranking.matches()[0].distance, 0.0);
        assert_eq!(ranking.matches()[2].distance, 1.0);
        assert_eq!(ranking.metric(), "cosine");
    }

    #[test]
    fn test_rank_unknown_query() {
        let c = collection(&[("a", &[1.0])]);
        assert_eq!(
            rank("missing_id", &c, &Metric::Cosine).unwrap_err(),
            RankingError::UnknownQuery {
                query_id: "missing_id".to_string()
            }
        );
    }

    #[test]
    fn test_rank_dimension_mismatch_reports_smallest_identifier() {
        let c = collection(&[
            ("q", &[1.0, 0.0]),
            ("z", &[1.0, 0.0, 0.0]),
            ("m", &[1.0]),
            ("ok", &[0.5, 0.5]),
        ]);

        assert_eq!(
            rank("q", &c, &Metric::Cosine).unwrap_err(),
            RankingError::DimensionMismatch {
                identifier: "m".to_string(),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_rank_single_entry_is_empty() {
        let c = collection(&[("q", &[1.0, 2.0])]);
        let ranking = rank("q", &c, &Metric::Cosine).unwrap();
        assert!(ranking.is_empty());
        assert_eq!(
            ranking.require_non_empty().unwrap_err(),
            RankingError::EmptyCandidateSet
        );
    }

    #[test]
    fn test_rank_fingerprint_includes_everything() {
        let c = collection(&[("a", &[1.0, 0.0]), ("b", &[0.0, 1.0])]);
        let query = Fingerprint::new(vec![1.0, 0.0]);
        let ranking = rank_fingerprint(&query, &c, &Metric::Euclidean).unwrap();

        assert_eq!(ranking.identifiers(), vec!["a", "b"]);
        assert_eq!(ranking.metric(), "euclidean");
    }

    #[test]
    fn test_top_k_matches_full_sort_prefix() {
        let mut entries: Vec<(String, Vec<f32>)> = Vec::new();
        for i in 0..40 {
            // Several identical vectors to force ties
            let angle = (i % 7) as f32 * 0.2;
            entries.push((format!("clip_{:02}", 39 - i), vec![angle.cos(), angle.sin()]));
        }
        let mut c = FingerprintCollection::new();
        for (id, values) in &entries {
            c.insert(ReferenceRecord::new(id.clone(), Fingerprint::new(values.clone())));
        }
        let query = Fingerprint::new(vec![1.0, 0.1]);

        let full = rank_fingerprint(&query, &c, &Metric::Cosine).unwrap();
        for k in [0, 1, 5, 13, 40, 100] {
            let top = rank_top_k(&query, &c, &Metric::Cosine, k).unwrap();
            let expected: Vec<_> = full.matches().iter().take(k).cloned().collect();
            assert_eq!(top.matches(), expected.as_slice(), "k = {}", k);
        }
    }

    #[test]
    fn test_filter_threshold_then_limit() {
        let ranking = Ranking::new(
            "cosine",
            vec![
                RankedMatch {
                    identifier: "a".to_string(),
                    distance: 0.05,
                    storage_ref: None,
                },
                RankedMatch {
                    identifier: "b".to_string(),
                    distance: 0.1,
                    storage_ref: None,
                },
                RankedMatch {
                    identifier: "c".to_string(),
                    distance: 0.5,
                    storage_ref: None,
                },
            ],
        );

        let filtered = ranking.clone().filter(Some(0.8), None);
        assert_eq!(filtered.identifiers(), vec!["a", "b"]);

        let limited = ranking.filter(Some(0.8), Some(1));
        assert_eq!(limited.identifiers(), vec!["a"]);
    }

    #[test]
    fn test_storage_ref_carried_through() {
        let mut c = FingerprintCollection::new();
        c.insert(
            ReferenceRecord::new("a", Fingerprint::new(vec![1.0]))
                .with_storage_ref(StorageRef::new("blob-1")),
        );
        let ranking = rank_fingerprint(&Fingerprint::new(vec![1.0]), &c, &Metric::Cosine).unwrap();
        assert_eq!(
            ranking.matches()[0].storage_ref,
            Some(StorageRef::new("blob-1"))
        );
    }
}
