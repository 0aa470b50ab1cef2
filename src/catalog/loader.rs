//! Batch loader: fingerprint every qualifying entry of a source.
//!
//! One entry's failure never aborts the batch. Each entry produces an
//! [`ItemOutcome`]; successes go into the collection and failures are
//! reported as [`SkippedItem`]s on the [`BatchReport`].

use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::analysis::MfccExtractor;
use crate::catalog::source::{CatalogEntry, CatalogSource, EntryFilter};
use crate::catalog::{FingerprintCollection, ReferenceRecord};
use crate::error::{CatalogError, ErrorCode, ExtractionError};

/// Result of fingerprinting one entry
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Loaded(ReferenceRecord),
    Skipped(SkippedItem),
}

/// An entry that could not be fingerprinted
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub identifier: String,
    pub reason: ExtractionError,
}

/// Collection of successful entries plus everything that was skipped
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub collection: FingerprintCollection,
    pub skipped: Vec<SkippedItem>,
}

impl BatchReport {
    pub fn loaded_count(&self) -> usize {
        self.collection.len()
    }

    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    /// Fold another report in; entries from `other` win on identifier clashes
    pub fn merge(&mut self, other: BatchReport) {
        for record in other.collection.records() {
            self.collection.insert(record.clone());
        }
        self.skipped.extend(other.skipped);
    }
}

/// Fingerprint one entry
pub fn extract_entry(entry: &CatalogEntry, extractor: &MfccExtractor) -> ItemOutcome {
    match extractor.extract(&entry.source) {
        Ok(fingerprint) => {
            let mut record = ReferenceRecord::new(entry.identifier.clone(), fingerprint);
            record.storage_ref = entry.storage_ref.clone();
            ItemOutcome::Loaded(record)
        }
        Err(reason) => ItemOutcome::Skipped(SkippedItem {
            identifier: entry.identifier.clone(),
            reason,
        }),
    }
}

/// Fingerprint every entry of `source` accepted by `filter`
///
/// # Errors
/// Only enumeration of the source itself can fail the call; per-entry
/// extraction failures are returned in [`BatchReport::skipped`].
pub fn load_all(
    source: &dyn CatalogSource,
    filter: &dyn EntryFilter,
    extractor: &MfccExtractor,
) -> Result<BatchReport, CatalogError> {
    let started = Instant::now();
    let entries: Vec<CatalogEntry> = source
        .entries()?
        .into_iter()
        .filter(|entry| filter.accepts(entry))
        .collect();

    tracing::info!(
        "[BatchLoader] Fingerprinting {} entries from {}",
        entries.len(),
        source.describe()
    );

    let outcomes = extract_all(&entries, extractor);

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            ItemOutcome::Loaded(record) => {
                if let Some(previous) = report.collection.insert(record) {
                    tracing::warn!(
                        "[BatchLoader] Duplicate identifier '{}'; keeping the later entry",
                        previous.identifier
                    );
                }
            }
            ItemOutcome::Skipped(item) => {
                tracing::warn!(
                    "[BatchLoader] Skipping '{}': code={}, {}",
                    item.identifier,
                    item.reason.code(),
                    item.reason.message()
                );
                report.skipped.push(item);
            }
        }
    }

    tracing::info!(
        "[BatchLoader] Loaded {} fingerprints, skipped {} in {:?}",
        report.loaded_count(),
        report.skip_count(),
        started.elapsed()
    );

    Ok(report)
}

#[cfg(feature = "parallel")]
fn extract_all(entries: &[CatalogEntry], extractor: &MfccExtractor) -> Vec<ItemOutcome> {
    entries
        .par_iter()
        .map(|entry| extract_entry(entry, extractor))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn extract_all(entries: &[CatalogEntry], extractor: &MfccExtractor) -> Vec<ItemOutcome> {
    entries
        .iter()
        .map(|entry| extract_entry(entry, extractor))
        .collect()
}
