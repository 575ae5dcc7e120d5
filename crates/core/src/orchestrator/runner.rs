//! Batch runner implementation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::describer::Describer;
use crate::mapping::{MappingRecord, MappingStore};
use crate::metrics;
use crate::optimizer::{optimize, OptimizationSpec};
use crate::publisher::{Publisher, PublisherError, UploadMetadata};
use crate::retry::RetryPolicy;
use crate::source::{SourceError, SourceFetcher, SourceId};

use super::config::OrchestratorConfig;
use super::types::{BatchReport, ItemOutcome, ItemState, OrchestratorError};

/// Per-item error: either attributed to the item or fatal to the run.
enum ItemError {
    Item(String),
    Fatal(OrchestratorError),
}

impl From<SourceError> for ItemError {
    fn from(e: SourceError) -> Self {
        ItemError::Item(e.to_string())
    }
}

impl From<PublisherError> for ItemError {
    fn from(e: PublisherError) -> Self {
        if e.is_fatal() {
            ItemError::Fatal(OrchestratorError::Publisher(e))
        } else {
            ItemError::Item(e.to_string())
        }
    }
}

/// The batch orchestrator: owns each item's in-memory lifecycle and drives
/// it through optimize → publish → describe → record.
pub struct BatchRunner {
    config: OrchestratorConfig,
    spec: OptimizationSpec,
    publisher: Arc<dyn Publisher>,
    store: Arc<dyn MappingStore>,
    describer: Option<Arc<dyn Describer>>,
    fetcher: Arc<SourceFetcher>,
    retry: RetryPolicy,
}

impl BatchRunner {
    pub fn new(
        config: OrchestratorConfig,
        spec: OptimizationSpec,
        publisher: Arc<dyn Publisher>,
        store: Arc<dyn MappingStore>,
        describer: Option<Arc<dyn Describer>>,
        fetcher: SourceFetcher,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            config,
            spec,
            publisher,
            store,
            describer,
            fetcher: Arc::new(fetcher),
            retry,
        }
    }

    /// Process a batch of sources and report the outcome.
    ///
    /// Items are independent: per-item failures are collected into the
    /// report. Only fatal backend errors (credentials, configuration) and a
    /// failed publisher preflight abort the run.
    pub async fn run(&self, sources: &[SourceId]) -> Result<BatchReport, OrchestratorError> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!(
            "Starting batch {} ({} items, backend {})",
            run_id,
            sources.len(),
            self.publisher.name()
        );

        let mut describe = self.config.generate_descriptions && self.describer.is_some();

        if self.config.preflight {
            if !self.publisher.test_connection().await {
                return Err(OrchestratorError::Preflight(format!(
                    "{} backend connection test failed",
                    self.publisher.name()
                )));
            }
            if describe {
                let describer = self.describer.as_ref().expect("describe implies describer");
                if !describer.test_connection().await {
                    warn!("Description service preflight failed, descriptions disabled for this run");
                    describe = false;
                }
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_items.max(1)));
        let tasks = sources.iter().map(|source| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                self.process_item(source, describe).await
            }
        });

        let results = futures::future::join_all(tasks).await;

        let mut items = Vec::with_capacity(results.len());
        for result in results {
            items.push(result?);
        }

        let report = BatchReport::from_outcomes(run_id, started_at, items);
        info!(
            "Batch {} finished: {} processed, {} skipped, {} failed, {} bytes saved",
            report.run_id,
            report.processed,
            report.skipped,
            report.failed,
            report.bytes_saved()
        );
        Ok(report)
    }

    async fn process_item(
        &self,
        source: &SourceId,
        describe: bool,
    ) -> Result<ItemOutcome, OrchestratorError> {
        let source_key = source.as_str();

        // Idempotence gate: identical source and spec is a no-op.
        match self.store.lookup(&source_key) {
            Ok(Some(existing)) if existing.spec == self.spec => {
                debug!("{}: already mapped with identical spec, skipping", source_key);
                metrics::ITEMS_TOTAL.with_label_values(&["skipped"]).inc();
                return Ok(ItemOutcome::skipped(source_key, existing.artifact.public_url));
            }
            Ok(Some(_)) => {
                debug!("{}: spec changed, re-publishing", source_key);
            }
            Ok(None) => {}
            Err(e) => {
                metrics::ITEMS_TOTAL.with_label_values(&["failed"]).inc();
                return Ok(ItemOutcome::failed(
                    source_key,
                    format!("mapping lookup failed: {}", e),
                ));
            }
        }

        match self.publish_and_record(source, &source_key, describe).await {
            Ok(outcome) => {
                metrics::ITEMS_TOTAL.with_label_values(&["recorded"]).inc();
                Ok(outcome)
            }
            Err(ItemError::Item(reason)) => {
                warn!("{}: failed: {}", source_key, reason);
                metrics::ITEMS_TOTAL.with_label_values(&["failed"]).inc();
                Ok(ItemOutcome::failed(source_key, reason))
            }
            Err(ItemError::Fatal(e)) => Err(e),
        }
    }

    async fn publish_and_record(
        &self,
        source: &SourceId,
        source_key: &str,
        describe: bool,
    ) -> Result<ItemOutcome, ItemError> {
        let fast_path = source.is_remote()
            && self.config.use_remote_fast_path
            && self.publisher.capabilities().remote_fetch;

        let (artifact, bytes_in, bytes_out) = if fast_path {
            debug!("{}: {} (server-side fetch)", source_key, ItemState::Publishing);
            let metadata = UploadMetadata::new(None, self.spec);
            let url = source_key.to_string();
            let started = Instant::now();
            let artifact = self
                .retry
                .run("upload", PublisherError::is_transient, || {
                    self.publisher.upload_from_source_url(&url, &metadata)
                })
                .await?;
            metrics::UPLOAD_DURATION
                .with_label_values(&[self.publisher.name().as_str()])
                .observe(started.elapsed().as_secs_f64());
            (artifact, 0u64, 0u64)
        } else {
            debug!("{}: {}", source_key, ItemState::Optimizing);
            let fetched = self.fetcher.fetch(source).await?;
            let bytes_in = fetched.bytes.len() as u64;

            let spec = self.spec;
            let bytes = fetched.bytes;
            let optimized = tokio::task::spawn_blocking(move || optimize(&bytes, &spec))
                .await
                .map_err(|e| ItemError::Item(format!("optimizer task panicked: {}", e)))?
                .map_err(|e| ItemError::Item(e.to_string()))?;

            debug!(
                "{}: optimized to {} ({} -> {} bytes)",
                source_key,
                optimized.format,
                bytes_in,
                optimized.size_bytes()
            );

            debug!("{}: {}", source_key, ItemState::Publishing);
            let metadata = UploadMetadata::new(Some(optimized.format), self.spec);
            let started = Instant::now();
            let artifact = self
                .retry
                .run("upload", PublisherError::is_transient, || {
                    self.publisher
                        .upload_bytes(&optimized.bytes, &fetched.file_name, &metadata)
                })
                .await?;
            metrics::UPLOAD_DURATION
                .with_label_values(&[self.publisher.name().as_str()])
                .observe(started.elapsed().as_secs_f64());

            let bytes_out = optimized.size_bytes() as u64;
            metrics::BYTES_IN_TOTAL.inc_by(bytes_in);
            metrics::BYTES_OUT_TOTAL.inc_by(bytes_out);
            (artifact, bytes_in, bytes_out)
        };

        // Best-effort: a missing description never fails the item.
        let description = if describe {
            debug!("{}: {}", source_key, ItemState::Describing);
            let describer = self.describer.as_ref().expect("describe implies describer");
            let description = describer
                .describe(&artifact.public_url, &self.config.description_keywords)
                .await;
            metrics::DESCRIPTIONS_TOTAL
                .with_label_values(&[description.status.as_str()])
                .inc();
            Some(description)
        } else {
            None
        };

        let record = MappingRecord::new(source_key, artifact.clone(), self.spec, description);
        self.store
            .upsert(&record)
            .map_err(|e| ItemError::Item(format!("mapping upsert failed: {}", e)))?;

        debug!("{}: {}", source_key, ItemState::Recorded);
        Ok(ItemOutcome::recorded(
            source_key,
            artifact.public_url,
            bytes_in,
            bytes_out,
        ))
    }
}
