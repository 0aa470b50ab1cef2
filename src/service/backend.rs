//! Nearest-fingerprint lookup behind a trait.
//!
//! The in-process catalog is one backend; a hosted vector index is another.
//! Both take a query fingerprint and return an ordered identifier + distance
//! list, so the service treats them interchangeably.

use crate::analysis::Fingerprint;
use crate::catalog::CatalogHandle;
use crate::error::QueryError;
use crate::ranking::{rank_fingerprint, rank_top_k, Metric, Ranking};

pub trait SimilarityBackend: Send + Sync {
    /// Label used in log lines
    fn name(&self) -> &str;

    /// The `limit` nearest references to `query`, ascending by distance
    ///
    /// `None` means every reference.
    fn nearest(
        &self,
        query: &Fingerprint,
        metric: Metric,
        limit: Option<usize>,
    ) -> Result<Ranking, QueryError>;
}

impl SimilarityBackend for CatalogHandle {
    fn name(&self) -> &str {
        "in-process"
    }

    fn nearest(
        &self,
        query: &Fingerprint,
        metric: Metric,
        limit: Option<usize>,
    ) -> Result<Ranking, QueryError> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Err(QueryError::EmptyReferenceSet);
        }

        let ranking = match limit {
            Some(k) => rank_top_k(query, &snapshot, &metric, k)?,
            None => rank_fingerprint(query, &snapshot, &metric)?,
        };
        Ok(ranking)
    }
}
