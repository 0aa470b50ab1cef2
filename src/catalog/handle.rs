//! Shared, atomically swappable reference collection.

use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::FingerprintCollection;

/// Cloneable handle to the currently served collection
///
/// Readers take an `Arc` snapshot and rank against it without holding any
/// lock; writers build a complete replacement and swap the pointer. A
/// snapshot is never mutated after it has been handed out.
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    current: Arc<RwLock<Arc<FingerprintCollection>>>,
}

impl CatalogHandle {
    pub fn new(collection: FingerprintCollection) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(collection))),
        }
    }

    /// Current collection; unaffected by later swaps
    pub fn snapshot(&self) -> Arc<FingerprintCollection> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a whole new collection, returning the previous one
    pub fn replace(&self, collection: FingerprintCollection) -> Arc<FingerprintCollection> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(collection))
    }

    /// Copy-on-write edit
    ///
    /// `edit` runs on a private copy while the write lock is held, so
    /// concurrent updates serialize. The copy is swapped in only when `edit`
    /// returns `Ok`.
    pub fn update<T, E, F>(&self, edit: F) -> Result<T, E>
    where
        F: FnOnce(&mut FingerprintCollection) -> Result<T, E>,
    {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = FingerprintCollection::clone(&current);
        let value = edit(&mut next)?;
        *current = Arc::new(next);
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Fingerprint;
    use crate::catalog::ReferenceRecord;
    use crate::error::CatalogError;

    fn record(id: &str) -> ReferenceRecord {
        ReferenceRecord::new(id, Fingerprint::new(vec![1.0, 0.0]))
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let handle = CatalogHandle::default();
        let before = handle.snapshot();

        let mut next = FingerprintCollection::new();
        next.insert(record("a"));
        handle.replace(next);

        assert!(before.is_empty());
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn test_failed_update_leaves_collection_untouched() {
        let handle = CatalogHandle::default();
        handle
            .update(|c| c.insert_checked(record("a")).map(|_| ()))
            .unwrap();

        let result = handle.update(|c| {
            c.insert(record("b"));
            c.insert_checked(ReferenceRecord::new("c", Fingerprint::new(vec![1.0])))
                .map(|_| ())
        });

        assert!(matches!(result, Err(CatalogError::DimensionMismatch { .. })));
        assert_eq!(handle.snapshot().identifiers(), vec!["a"]);
    }

    #[test]
    fn test_clones_share_state() {
        let handle = CatalogHandle::default();
        let other = handle.clone();
        handle
            .update(|c| Ok::<_, CatalogError>(c.insert(record("a"))))
            .unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_see_whole_collections() {
        let handle = CatalogHandle::default();
        let writer = {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for round in 1..=50usize {
                    let mut next = FingerprintCollection::new();
                    for i in 0..round {
                        next.insert(record(&format!("r{}_{}", round, i)));
                    }
                    handle.replace(next);
                }
            })
        };

        for _ in 0..200 {
            let snapshot = handle.snapshot();
            // Every identifier in a snapshot comes from the same round
            let rounds: std::collections::HashSet<_> = snapshot
                .identifiers()
                .iter()
                .map(|id| id.split('_').next().unwrap_or_default().to_string())
                .collect();
            assert!(rounds.len() <= 1);
        }
        writer.join().unwrap();
        assert_eq!(handle.len(), 50);
    }
}
