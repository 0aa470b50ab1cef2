//! Enumerable sources of reference audio and the filters that select entries.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::audio::AudioSource;
use crate::catalog::StorageRef;
use crate::config::CatalogConfig;
use crate::error::CatalogError;

/// One candidate item offered by a [`CatalogSource`]
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Key the fingerprint is stored under
    pub identifier: String,
    pub source: AudioSource,
    pub storage_ref: Option<StorageRef>,
}

/// Anything that can list candidate audio items
///
/// Enumeration either succeeds as a whole or fails with
/// `CatalogError::SourceUnavailable`; unreadable individual items are the
/// loader's concern.
pub trait CatalogSource: Send + Sync {
    /// Short label for log lines
    fn describe(&self) -> String;

    fn entries(&self) -> Result<Vec<CatalogEntry>, CatalogError>;
}

/// Predicate selecting which entries get fingerprinted
pub trait EntryFilter: Sync {
    fn accepts(&self, entry: &CatalogEntry) -> bool;
}

impl<F> EntryFilter for F
where
    F: Fn(&CatalogEntry) -> bool + Sync,
{
    fn accepts(&self, entry: &CatalogEntry) -> bool {
        self(entry)
    }
}

/// Case-insensitive file-name suffix match
///
/// Suffixes are compared against the identifier, so multi-part suffixes
/// such as `.adg.ogg` work as well as plain extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionFilter {
    suffixes: Vec<String>,
}

impl ExtensionFilter {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(&config.extensions)
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Whether `name` ends with one of the suffixes
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl EntryFilter for ExtensionFilter {
    fn accepts(&self, entry: &CatalogEntry) -> bool {
        self.matches_name(&entry.identifier)
    }
}

/// Files under one or more local directories
///
/// The identifier is the bare file name, so the same name in two roots
/// collides; the loader keeps the later one. The storage reference is the
/// full path.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    roots: Vec<PathBuf>,
    recursive: bool,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_roots(vec![root.into()])
    }

    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            recursive: false,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn collect_dir(
        &self,
        dir: &Path,
        entries: &mut Vec<CatalogEntry>,
    ) -> Result<(), std::io::Error> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                if self.recursive {
                    if let Err(err) = self.collect_dir(&path, entries) {
                        log::warn!("[DirectorySource] Skipping {}: {}", path.display(), err);
                    }
                }
                continue;
            }

            let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            entries.push(CatalogEntry {
                identifier: name,
                storage_ref: Some(StorageRef::new(path.display().to_string())),
                source: AudioSource::Path(path),
            });
        }
        Ok(())
    }
}

impl CatalogSource for DirectorySource {
    fn describe(&self) -> String {
        let roots: Vec<String> = self.roots.iter().map(|r| r.display().to_string()).collect();
        format!("directories [{}]", roots.join(", "))
    }

    fn entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut entries = Vec::new();
        for root in &self.roots {
            self.collect_dir(root, &mut entries)
                .map_err(|err| CatalogError::SourceUnavailable {
                    reason: format!("{}: {}", root.display(), err),
                })?;
        }
        Ok(entries)
    }
}

/// In-memory clips, e.g. bytes fetched from a blob store
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<CatalogEntry>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clip; the container hint comes from the identifier's extension
    pub fn with_clip<S, D>(mut self, identifier: S, data: D) -> Self
    where
        S: Into<String>,
        D: Into<Arc<[u8]>>,
    {
        let identifier = identifier.into();
        self.entries.push(CatalogEntry {
            source: AudioSource::from_upload(data, &identifier),
            identifier,
            storage_ref: None,
        });
        self
    }

    pub fn push(&mut self, entry: CatalogEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogSource for MemorySource {
    fn describe(&self) -> String {
        format!("{} in-memory clips", self.entries.len())
    }

    fn entries(&self) -> Result<Vec<CatalogEntry>, CatalogError> {
        Ok(self.entries.clone())
    }
}
