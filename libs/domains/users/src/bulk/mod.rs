//! Concurrent bulk user pipeline.
//!
//! Two stages share one bounded worker pool: synthetic generation fans out
//! CPU-bound batches, import fans out store-bound batches. The pool is owned
//! by the pipeline and injected at construction, never a process-wide global.

mod generator;
mod import;
mod partition;

pub use generator::generate_batch;
pub use partition::{batch_count, partition};

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{UserError, UserResult};
use crate::hasher::CredentialHasher;
use crate::models::{GeneratedUser, ImportSummary};
use crate::repository::UserRepository;

/// Tuning knobs for the bulk pipeline.
#[derive(Debug, Clone)]
pub struct BulkConfig {
    /// Maximum number of batches in flight at once
    pub pool_size: usize,
    /// Target batch size for the generation stage
    pub generation_batch_size: usize,
    /// Fixed batch size for the import stage
    pub import_batch_size: usize,
    /// Upper bound on a single generation request
    pub max_generation_count: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            generation_batch_size: 1000,
            import_batch_size: 100,
            max_generation_count: 200_000,
        }
    }
}

/// Runs generation and import work across a bounded pool of tokio tasks.
pub struct BulkPipeline<R: UserRepository + 'static> {
    repository: Arc<R>,
    hasher: Arc<dyn CredentialHasher>,
    pool: Arc<Semaphore>,
    config: BulkConfig,
}

impl<R: UserRepository + 'static> BulkPipeline<R> {
    pub fn new(repository: Arc<R>, hasher: Arc<dyn CredentialHasher>, config: BulkConfig) -> Self {
        let pool = Arc::new(Semaphore::new(config.pool_size.max(1)));
        Self {
            repository,
            hasher,
            pool,
            config,
        }
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    /// Generate `count` synthetic users in parallel batches.
    ///
    /// The workload is cut into near-equal contiguous batches, one per worker
    /// up to the pool bound and available parallelism. Results preserve no
    /// particular order.
    pub async fn generate_users(&self, count: usize) -> UserResult<Vec<GeneratedUser>> {
        if count == 0 || count > self.config.max_generation_count {
            return Err(UserError::Validation(format!(
                "Count must be a positive integer no greater than {}",
                self.config.max_generation_count
            )));
        }

        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let batches = partition::batch_count(count, self.config.generation_batch_size, parallelism);

        let mut tasks = JoinSet::new();
        for range in partition::partition(count, batches) {
            let pool = Arc::clone(&self.pool);
            tasks.spawn(async move {
                let _permit = pool
                    .acquire_owned()
                    .await
                    .map_err(|_| UserError::Pipeline("worker pool closed".to_string()))?;
                Ok::<_, UserError>(generator::generate_batch(range.len()))
            });
        }

        let mut users = Vec::with_capacity(count);
        while let Some(joined) = tasks.join_next().await {
            let batch = joined.map_err(|e| UserError::Pipeline(e.to_string()))??;
            users.extend(batch);
        }

        tracing::info!(count = users.len(), "Generated synthetic users");
        Ok(users)
    }

    /// Import candidate records in parallel fixed-size batches.
    ///
    /// Each batch deduplicates against the store and bulk-inserts its
    /// survivors independently; one failed batch never aborts its siblings.
    /// The summary always satisfies `total == imported + failed`.
    pub async fn import_users(&self, records: Vec<GeneratedUser>) -> UserResult<ImportSummary> {
        if records.is_empty() {
            return Err(UserError::Validation(
                "No user records provided to import".to_string(),
            ));
        }

        let total_records = records.len();
        let batch_size = self.config.import_batch_size.max(1);

        let mut tasks = JoinSet::new();
        let mut remaining = records;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(batch_size));
            let batch = std::mem::replace(&mut remaining, rest);

            let pool = Arc::clone(&self.pool);
            let repository = Arc::clone(&self.repository);
            let hasher = Arc::clone(&self.hasher);
            tasks.spawn(async move {
                let _permit = pool
                    .acquire_owned()
                    .await
                    .map_err(|_| UserError::Pipeline("worker pool closed".to_string()))?;
                import::import_batch(repository.as_ref(), hasher.as_ref(), batch).await
            });
        }

        let mut successfully_imported = 0;
        while let Some(joined) = tasks.join_next().await {
            successfully_imported += joined.map_err(|e| UserError::Pipeline(e.to_string()))??;
        }

        let summary = ImportSummary {
            total_records,
            successfully_imported,
            failed_to_import: total_records - successfully_imported,
        };
        tracing::info!(
            total = summary.total_records,
            imported = summary.successfully_imported,
            failed = summary.failed_to_import,
            "Bulk import finished"
        );
        Ok(summary)
    }
}
