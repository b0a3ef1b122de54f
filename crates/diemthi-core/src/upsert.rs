//! Single-batch upsert execution.

use std::time::Duration;

use tracing::debug;

use crate::batch::collapse_duplicates;
use crate::error::AppError;
use crate::models::StudentRecord;
use crate::traits::StudentStore;

/// Writes one batch to a [`StudentStore`] as a single bulk upsert.
///
/// Before writing, duplicate registration numbers inside the batch are
/// collapsed so that the last occurrence wins. Across batches, the batch
/// written later wins.
#[derive(Clone)]
pub struct UpsertExecutor<S: StudentStore> {
    store: S,
    timeout: Duration,
}

impl<S: StudentStore> UpsertExecutor<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Applies one batch and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// - [`AppError::EmptyBatch`] if `records` is empty.
    /// - [`AppError::StoreTimeout`] if the store does not answer in time.
    /// - Any error returned by the store.
    pub async fn apply_batch(&self, records: &[StudentRecord]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Err(AppError::EmptyBatch);
        }

        let collapsed = collapse_duplicates(records);
        if collapsed.len() == records.len() {
            return self.write(records).await;
        }

        debug!(
            records = records.len(),
            distinct = collapsed.len(),
            "Collapsed duplicate registration numbers in batch"
        );
        let distinct: Vec<StudentRecord> = collapsed.into_iter().cloned().collect();
        self.write(&distinct).await
    }

    async fn write(&self, records: &[StudentRecord]) -> Result<u64, AppError> {
        tokio::time::timeout(self.timeout, self.store.upsert_batch(records))
            .await
            .map_err(|_| AppError::StoreTimeout(self.timeout.as_secs()))?
    }
}
