//! Reference records and the identifier → record mapping.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::Fingerprint;
use crate::error::CatalogError;

/// Opaque reference to where a clip's bytes live in an external blob store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageRef(String);

impl StorageRef {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reference clip: identifier, fingerprint and where its audio lives
///
/// Keeping the storage reference next to the fingerprint lets a ranking be
/// joined back to retrievable bytes without a second lookup by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub identifier: String,
    pub fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_ref: Option<StorageRef>,
}

impl ReferenceRecord {
    pub fn new<S: Into<String>>(identifier: S, fingerprint: Fingerprint) -> Self {
        Self {
            identifier: identifier.into(),
            fingerprint,
            storage_ref: None,
        }
    }

    pub fn with_storage_ref(mut self, storage_ref: StorageRef) -> Self {
        self.storage_ref = Some(storage_ref);
        self
    }
}

/// Mapping from identifier to reference record
///
/// Keys are unique and carry no order; ordering only comes out of ranking.
/// [`insert`](Self::insert) accepts any record, while
/// [`insert_checked`](Self::insert_checked) enforces a single dimensionality.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintCollection {
    records: HashMap<String, ReferenceRecord>,
}

impl FingerprintCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from metadata-store rows carrying precomputed fingerprints
    ///
    /// Rejects duplicate identifiers and inconsistent dimensionality.
    pub fn from_records<I>(records: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = ReferenceRecord>,
    {
        let mut collection = Self::new();
        for record in records {
            if collection.contains(&record.identifier) {
                return Err(CatalogError::DuplicateIdentifier {
                    identifier: record.identifier,
                });
            }
            collection.insert_checked(record)?;
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier)
    }

    pub fn get(&self, identifier: &str) -> Option<&ReferenceRecord> {
        self.records.get(identifier)
    }

    pub fn fingerprint(&self, identifier: &str) -> Option<&Fingerprint> {
        self.records.get(identifier).map(|record| &record.fingerprint)
    }

    pub fn records(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.values()
    }

    /// Identifiers in lexical order
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.records.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Shared dimensionality, `None` when empty or inconsistent
    pub fn dimension(&self) -> Option<usize> {
        let mut dims = self.records.values().map(|r| r.fingerprint.dimension());
        let first = dims.next()?;
        dims.all(|d| d == first).then_some(first)
    }

    /// Insert or replace a record without dimensionality checks
    pub fn insert(&mut self, record: ReferenceRecord) -> Option<ReferenceRecord> {
        self.records.insert(record.identifier.clone(), record)
    }

    /// Insert or replace a record whose dimensionality matches the others
    pub fn insert_checked(
        &mut self,
        record: ReferenceRecord,
    ) -> Result<Option<ReferenceRecord>, CatalogError> {
        let actual = record.fingerprint.dimension();
        let existing = self
            .records
            .values()
            .find(|other| other.identifier != record.identifier)
            .map(|other| other.fingerprint.dimension());

        if let Some(expected) = existing {
            if expected != actual {
                return Err(CatalogError::DimensionMismatch {
                    identifier: record.identifier,
                    expected,
                    actual,
                });
            }
        }

        Ok(self.insert(record))
    }

    pub fn remove(&mut self, identifier: &str) -> Option<ReferenceRecord> {
        self.records.remove(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, values: &[f32]) -> ReferenceRecord {
        ReferenceRecord::new(id, Fingerprint::new(values.to_vec()))
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut collection = FingerprintCollection::new();
        assert!(collection.insert(record("a", &[1.0])).is_none());
        let previous = collection.insert(record("a", &[2.0]));

        assert_eq!(previous.unwrap().fingerprint.as_slice(), &[1.0]);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.fingerprint("a").unwrap().as_slice(), &[2.0]);
    }

    #[test]
    fn test_insert_checked_rejects_other_dimension() {
        let mut collection = FingerprintCollection::new();
        collection.insert_checked(record("a", &[1.0, 2.0])).unwrap();

        let err = collection
            .insert_checked(record("b", &[1.0, 2.0, 3.0]))
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DimensionMismatch {
                identifier: "b".to_string(),
                expected: 2,
                actual: 3
            }
        );

        // Replacing the only record may change the dimension
        collection.insert_checked(record("a", &[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(collection.dimension(), Some(3));
    }

    #[test]
    fn test_dimension_none_when_inconsistent() {
        let mut collection = FingerprintCollection::new();
        assert_eq!(collection.dimension(), None);
        collection.insert(record("a", &[1.0, 2.0]));
        collection.insert(record("b", &[1.0]));
        assert_eq!(collection.dimension(), None);
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let err = FingerprintCollection::from_records(vec![
            record("kick.ogg", &[1.0]),
            record("kick.ogg", &[2.0]),
        ])
        .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateIdentifier { .. }));
    }

    #[test]
    fn test_rows_deserialize_into_records() {
        let rows = r#"[
            {"identifier": "snare.ogg", "fingerprint": [0.1, 0.2], "storage_ref": "blob-17"},
            {"identifier": "hat.ogg", "fingerprint": [0.3, 0.4]}
        ]"#;
        let records: Vec<ReferenceRecord> = serde_json::from_str(rows).unwrap();
        let collection = FingerprintCollection::from_records(records).unwrap();

        assert_eq!(collection.identifiers(), vec!["hat.ogg", "snare.ogg"]);
        assert_eq!(
            collection.get("snare.ogg").unwrap().storage_ref,
            Some(StorageRef::new("blob-17"))
        );
        assert_eq!(collection.get("hat.ogg").unwrap().storage_ref, None);
    }
}
