// Service module - query orchestration
//
// QueryService is the thin layer between callers (CLI, an HTTP front end)
// and the core: it validates uploads, bounds decoding with a timeout, asks a
// SimilarityBackend for neighbours, applies threshold/limit and maps every
// failure onto a QueryError with a stable code.

mod backend;
mod types;

pub use backend::SimilarityBackend;
pub use types::{
    AnalysisReport, AnalyzeOptions, BatchAnalysis, BatchItem, ErrorReport, InitializeSummary,
    ReferenceDetails, ReferenceSummary, SimilarFile, SkippedFile, Stats, Upload,
};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analysis::{Fingerprint, MfccExtractor};
use crate::catalog::{
    self, BatchReport, CatalogHandle, DirectorySource, ExtensionFilter, FingerprintCollection,
    ReferenceRecord,
};
use crate::config::{AppConfig, CatalogConfig, QueryConfig};
use crate::error::{log_query_error, QueryError};
use crate::ranking::{self, Metric};
use types::similar_files;

/// Orchestrates fingerprinting and ranking against a shared catalog
///
/// Cloning is cheap and clones share the same catalog.
#[derive(Clone)]
pub struct QueryService {
    catalog: CatalogHandle,
    extractor: Arc<MfccExtractor>,
    query: QueryConfig,
    catalog_config: CatalogConfig,
    backend: Option<Arc<dyn SimilarityBackend>>,
}

impl QueryService {
    /// Build a service with an empty catalog
    ///
    /// # Errors
    /// `Extraction(InvalidParameters)` when the extraction config is invalid
    pub fn new(config: &AppConfig) -> Result<Self, QueryError> {
        let extractor = MfccExtractor::new(config.extraction.clone())?;
        Ok(Self {
            catalog: CatalogHandle::default(),
            extractor: Arc::new(extractor),
            query: config.query.clone(),
            catalog_config: config.catalog.clone(),
            backend: None,
        })
    }

    /// Delegate neighbour lookup to an external index instead of the catalog
    pub fn with_backend(mut self, backend: Arc<dyn SimilarityBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    pub fn extractor(&self) -> &MfccExtractor {
        &self.extractor
    }

    /// Fingerprint every qualifying file in `directories` and swap the result in
    ///
    /// Blocking: runs the whole batch on the calling thread (and the rayon
    /// pool). Files that fail to decode are skipped and listed in the summary.
    pub fn initialize<P: AsRef<Path>>(
        &self,
        directories: &[P],
    ) -> Result<InitializeSummary, QueryError> {
        if directories.is_empty() {
            return Err(QueryError::InvalidDirectory {
                path: String::new(),
            });
        }
        for dir in directories {
            if !dir.as_ref().is_dir() {
                return Err(self.fail(
                    "initialize",
                    QueryError::InvalidDirectory {
                        path: dir.as_ref().display().to_string(),
                    },
                ));
            }
        }

        let filter = ExtensionFilter::from_config(&self.catalog_config);
        let mut report = BatchReport::default();
        for dir in directories {
            let source = DirectorySource::new(dir.as_ref()).recursive(self.catalog_config.recursive);
            let batch = catalog::load_all(&source, &filter, &self.extractor)
                .map_err(|err| self.fail("initialize", err.into()))?;
            report.merge(batch);
        }

        let summary = InitializeSummary {
            num_files: report.loaded_count(),
            skipped: report.skipped.iter().map(SkippedFile::from).collect(),
            directories: directories
                .iter()
                .map(|d| d.as_ref().display().to_string())
                .collect(),
        };
        self.catalog.replace(report.collection);

        tracing::info!(
            "[QueryService] Initialized {} references ({} skipped)",
            summary.num_files,
            summary.skipped.len()
        );
        Ok(summary)
    }

    /// Replace the catalog with precomputed rows from a metadata store
    pub fn load_records<I>(&self, records: I) -> Result<usize, QueryError>
    where
        I: IntoIterator<Item = ReferenceRecord>,
    {
        let collection = FingerprintCollection::from_records(records)?;
        let count = collection.len();
        self.catalog.replace(collection);
        Ok(count)
    }

    /// Fingerprint an upload and return the references similar to it
    ///
    /// An empty `similar_files` means nothing cleared the threshold, which is
    /// distinct from `EmptyReferenceSet` (nothing loaded at all).
    pub async fn analyze(
        &self,
        upload: Upload,
        options: AnalyzeOptions,
    ) -> Result<AnalysisReport, QueryError> {
        let started = Instant::now();
        self.ensure_references()?;
        self.validate_upload(&upload)
            .map_err(|err| self.fail("analyze", err))?;

        let metric = self.resolve_metric(options.metric.as_deref())?;
        let threshold = options.threshold.unwrap_or(self.query.similarity_threshold);
        let limit = options.limit.unwrap_or(self.query.limit);

        let fingerprint = self
            .fingerprint(&upload)
            .await
            .map_err(|err| self.fail("analyze", err))?;
        let ranking = self
            .nearest(&fingerprint, metric, Some(limit))
            .map_err(|err| self.fail("analyze", err))?
            .filter(Some(threshold), Some(limit));

        let report = AnalysisReport {
            similar_files: similar_files(&ranking),
            analysis_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            input_features: fingerprint.into_vec(),
            threshold,
            metric: ranking.metric().to_string(),
        };

        tracing::info!(
            "[QueryService] Analyzed '{}': {} matches at threshold {:.2} in {:.1} ms",
            upload.filename,
            report.similar_files.len(),
            threshold,
            report.analysis_time_ms
        );
        Ok(report)
    }

    /// Nearest neighbours for several uploads, without a threshold
    ///
    /// A failing upload is reported inline and does not affect the others.
    pub async fn batch_analyze(&self, uploads: Vec<Upload>) -> Result<BatchAnalysis, QueryError> {
        self.ensure_references()?;
        let metric = self.resolve_metric(None)?;

        let mut results = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let outcome = match self.validate_upload(&upload) {
                Ok(()) => match self.fingerprint(&upload).await {
                    Ok(fingerprint) => self.nearest(&fingerprint, metric, Some(self.query.neighbours)),
                    Err(err) => Err(err),
                },
                Err(err) => Err(err),
            };

            let item = match outcome {
                Ok(ranking) => BatchItem {
                    filename: upload.filename,
                    similar_files: similar_files(&ranking),
                    error: None,
                },
                Err(err) => {
                    tracing::warn!(
                        "[QueryService] Batch item '{}' failed: {}",
                        upload.filename,
                        err
                    );
                    BatchItem {
                        filename: upload.filename,
                        similar_files: Vec::new(),
                        error: Some(ErrorReport::from_error(&err)),
                    }
                }
            };
            results.push(item);
        }

        Ok(BatchAnalysis { results })
    }

    /// A reference's fingerprint plus its nearest other references
    pub fn reference_details(&self, identifier: &str) -> Result<ReferenceDetails, QueryError> {
        let snapshot = self.catalog.snapshot();
        let record = snapshot
            .get(identifier)
            .ok_or_else(|| QueryError::ReferenceNotFound {
                identifier: identifier.to_string(),
            })?;

        let metric = self.resolve_metric(None)?;
        let ranking = ranking::rank(identifier, &snapshot, &metric)?
            .filter(None, Some(self.query.neighbours));

        Ok(ReferenceDetails {
            filename: record.identifier.clone(),
            features: record.fingerprint.as_slice().to_vec(),
            storage_ref: record.storage_ref.clone(),
            similar_files: similar_files(&ranking),
        })
    }

    /// Loaded references in identifier order
    pub fn list_references(&self) -> Vec<ReferenceSummary> {
        let snapshot = self.catalog.snapshot();
        snapshot
            .identifiers()
            .into_iter()
            .filter_map(|id| snapshot.get(id))
            .map(|record| ReferenceSummary {
                filename: record.identifier.clone(),
                dimensions: record.fingerprint.dimension(),
                storage_ref: record.storage_ref.clone(),
            })
            .collect()
    }

    /// Fingerprint an upload and add (or replace) it as a reference
    pub async fn add_reference(&self, upload: Upload) -> Result<String, QueryError> {
        self.validate_upload(&upload)
            .map_err(|err| self.fail("add_reference", err))?;
        let fingerprint = self
            .fingerprint(&upload)
            .await
            .map_err(|err| self.fail("add_reference", err))?;

        let record = ReferenceRecord::new(upload.filename.clone(), fingerprint);
        self.catalog
            .update(|collection| collection.insert_checked(record))
            .map_err(|err| self.fail("add_reference", err.into()))?;

        tracing::info!("[QueryService] Added reference '{}'", upload.filename);
        Ok(upload.filename)
    }

    pub fn remove_reference(&self, identifier: &str) -> Result<(), QueryError> {
        self.catalog.update(|collection| {
            collection
                .remove(identifier)
                .map(|_| ())
                .ok_or_else(|| QueryError::ReferenceNotFound {
                    identifier: identifier.to_string(),
                })
        })?;

        tracing::info!("[QueryService] Removed reference '{}'", identifier);
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        let snapshot = self.catalog.snapshot();
        Stats {
            total_reference_files: snapshot.len(),
            feature_dimensions: snapshot.dimension().unwrap_or(0),
        }
    }

    fn ensure_references(&self) -> Result<(), QueryError> {
        if self.backend.is_none() && self.catalog.is_empty() {
            return Err(QueryError::EmptyReferenceSet);
        }
        Ok(())
    }

    fn validate_upload(&self, upload: &Upload) -> Result<(), QueryError> {
        if upload.len() > self.query.max_upload_bytes {
            return Err(QueryError::UploadTooLarge {
                size: upload.len(),
                limit: self.query.max_upload_bytes,
            });
        }

        let filter = ExtensionFilter::from_config(&self.catalog_config);
        if !filter.matches_name(&upload.filename) {
            return Err(QueryError::UnsupportedFormat {
                filename: upload.filename.clone(),
            });
        }
        Ok(())
    }

    fn resolve_metric(&self, requested: Option<&str>) -> Result<Metric, QueryError> {
        let name = requested.unwrap_or(&self.query.metric);
        Ok(name.parse::<Metric>()?)
    }

    /// Decode and extract on the blocking pool, bounded by the decode timeout
    ///
    /// On timeout the worker keeps running to completion but its result is
    /// dropped.
    async fn fingerprint(&self, upload: &Upload) -> Result<Fingerprint, QueryError> {
        let extractor = Arc::clone(&self.extractor);
        let source = upload.to_source();
        let timeout_ms = self.query.decode_timeout_ms;

        let task = tokio::task::spawn_blocking(move || extractor.extract(&source));
        match tokio::time::timeout(Duration::from_millis(timeout_ms), task).await {
            Err(_) => Err(QueryError::DecodeTimeout { timeout_ms }),
            Ok(Err(join_err)) => Err(QueryError::Internal {
                reason: join_err.to_string(),
            }),
            Ok(Ok(result)) => Ok(result?),
        }
    }

    fn nearest(
        &self,
        query: &Fingerprint,
        metric: Metric,
        limit: Option<usize>,
    ) -> Result<ranking::Ranking, QueryError> {
        match &self.backend {
            Some(backend) => backend.nearest(query, metric, limit).map_err(|err| match err {
                QueryError::BackendFailure { .. } => err,
                other if other.is_client_error() => other,
                other => QueryError::BackendFailure {
                    reason: format!("{}: {}", backend.name(), other),
                },
            }),
            None => self.catalog.nearest(query, metric, limit),
        }
    }

    /// Log server-side faults at error level; client errors stay quiet
    fn fail(&self, context: &str, err: QueryError) -> QueryError {
        if err.is_client_error() {
            tracing::debug!("[QueryService] {} rejected input: {}", context, err);
        } else {
            log_query_error(&err, context);
        }
        err
    }
}
