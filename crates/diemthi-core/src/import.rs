//! CSV bulk import.
//!
//! [`ImportService`] drives one uploaded file through the pipeline:
//!
//! 1. **Decode** the payload as UTF-8 and strip a leading byte-order mark.
//! 2. **Parse** it with the `csv` crate, using the header row for column names.
//! 3. **Normalize** every row with [`normalize`](crate::normalize::normalize);
//!    rejected rows are tallied, never fatal.
//! 4. **Batch** accepted records with [`chunk`] and write each batch through
//!    [`UpsertExecutor`], strictly one after another.
//! 5. **Summarize** the counters in an [`ImportSummary`].
//!
//! Rows are pulled lazily from the reader, so at most one batch of records is
//! alive at a time regardless of file size.
//!
//! The first failed batch aborts the import. Batches written before it stay
//! committed and are reported in [`AppError::ImportAborted`].

use std::time::Instant;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecordsIntoIter, Trim};
use serde::Serialize;
use uuid::Uuid;

use crate::batch::chunk;
use crate::config::{ImportConfig, ScoreRangePolicy};
use crate::error::AppError;
use crate::models::StudentRecord;
use crate::normalize::{ColumnMap, SkipReason, SkipTally, normalize};
use crate::progress::{ImportEvent, ProgressReporter, SilentReporter};
use crate::traits::StudentStore;
use crate::upsert::UpsertExecutor;

/// Terminal state of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Succeeded,
    Failed,
}

/// Counters describing one import.
///
/// On success `skipped_records == total_records - imported_count`. On failure
/// `imported_count` only counts records of committed batches, `failed_records`
/// counts the batch that failed, and the three add up to `total_records`.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub import_id: Uuid,
    pub status: ImportStatus,
    /// Data rows read (header excluded).
    pub total_records: u64,
    /// Records accepted and written.
    pub imported_count: u64,
    pub skipped_records: u64,
    pub skip_reasons: SkipTally,
    /// Accepted records of the batch whose write failed.
    pub failed_records: u64,
    pub batches_committed: usize,
    /// Rows inserted or updated as reported by the store. Lower than
    /// `imported_count` when a batch repeats a registration number.
    pub rows_affected: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl ImportSummary {
    /// Creates an empty summary with a fresh import id.
    pub fn new() -> Self {
        Self {
            import_id: Uuid::new_v4(),
            status: ImportStatus::Succeeded,
            total_records: 0,
            imported_count: 0,
            skipped_records: 0,
            skip_reasons: SkipTally::default(),
            failed_records: 0,
            batches_committed: 0,
            rows_affected: 0,
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ImportStatus::Succeeded
    }
}

impl Default for ImportSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Service for importing exam result CSV files.
///
/// # Example
///
/// ```ignore
/// use diemthi_core::ImportService;
///
/// let service = ImportService::new(repo);
/// let summary = service.import_bytes(Some(&bytes)).await?;
/// println!("Imported {} of {} rows", summary.imported_count, summary.total_records);
/// ```
pub struct ImportService<S: StudentStore> {
    executor: UpsertExecutor<S>,
    config: ImportConfig,
}

impl<S: StudentStore> Clone for ImportService<S> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: StudentStore> ImportService<S> {
    /// Creates an import service with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ImportConfig::default())
    }

    pub fn with_config(store: S, config: ImportConfig) -> Self {
        Self {
            executor: UpsertExecutor::new(store, config.batch_timeout),
            config,
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Imports an uploaded file. `None` means no file was supplied.
    pub async fn import_bytes(&self, payload: Option<&[u8]>) -> Result<ImportSummary, AppError> {
        self.import_bytes_with_progress(payload, &SilentReporter)
            .await
    }

    /// Imports an uploaded file, reporting progress to `reporter`.
    ///
    /// # Errors
    ///
    /// - [`AppError::NoFile`] if `payload` is `None`.
    /// - [`AppError::InvalidEncoding`] if the payload is not UTF-8.
    /// - [`AppError::EmptyFile`] if the file holds no data rows.
    /// - [`AppError::MissingIdColumn`] / [`AppError::CsvError`] if the header
    ///   cannot be used.
    /// - [`AppError::ImportAborted`] if a batch write fails.
    pub async fn import_bytes_with_progress<R: ProgressReporter>(
        &self,
        payload: Option<&[u8]>,
        reporter: &R,
    ) -> Result<ImportSummary, AppError> {
        let text = decode(payload.ok_or(AppError::NoFile)?)?;
        if text.trim().is_empty() {
            return Err(AppError::EmptyFile);
        }

        let started = Instant::now();
        let mut summary = ImportSummary::new();

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let columns = ColumnMap::from_headers(reader.headers()?)?;

        reporter.report(ImportEvent::Started {
            import_id: summary.import_id,
            columns: reader.headers()?.len(),
            batch_size: self.config.batch_size.get(),
        });

        let rows = NormalizedRows {
            records: reader.into_records(),
            columns,
            policy: self.config.score_policy,
            import_id: summary.import_id,
            reporter,
            total: 0,
            tally: SkipTally::default(),
        };
        let mut batches = chunk(rows, self.config.batch_size);
        let mut batch_number = 0;

        while let Some(batch) = batches.next() {
            batch_number += 1;

            match self.executor.apply_batch(&batch).await {
                Ok(rows_affected) => {
                    summary.batches_committed += 1;
                    summary.imported_count += batch.len() as u64;
                    summary.rows_affected += rows_affected;
                    reporter.report(ImportEvent::BatchCommitted {
                        import_id: summary.import_id,
                        batch: batch_number,
                        records: batch.len(),
                        rows_affected,
                    });
                }
                Err(e) => {
                    let message = e.to_string();
                    reporter.report(ImportEvent::BatchFailed {
                        import_id: summary.import_id,
                        batch: batch_number,
                        records: batch.len(),
                        error: &message,
                    });

                    batches.inner().fill(&mut summary);
                    summary.failed_records = batch.len() as u64;
                    summary.status = ImportStatus::Failed;
                    summary.elapsed_ms = started.elapsed().as_millis() as u64;
                    reporter.report(ImportEvent::Finished { summary: &summary });

                    return Err(AppError::ImportAborted {
                        committed_records: summary.imported_count,
                        summary: Box::new(summary),
                        source: Box::new(e),
                    });
                }
            }
        }

        batches.inner().fill(&mut summary);
        if summary.total_records == 0 {
            return Err(AppError::EmptyFile);
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        reporter.report(ImportEvent::Finished { summary: &summary });
        Ok(summary)
    }
}

/// Interprets the payload as UTF-8 and strips a leading byte-order mark.
fn decode(bytes: &[u8]) -> Result<&str, AppError> {
    let text = std::str::from_utf8(bytes).map_err(|e| AppError::InvalidEncoding(e.valid_up_to()))?;
    Ok(text.strip_prefix('\u{FEFF}').unwrap_or(text))
}

/// Accepted records of a CSV reader, counting everything it drops.
struct NormalizedRows<'a, R: ProgressReporter> {
    records: StringRecordsIntoIter<&'a [u8]>,
    columns: ColumnMap,
    policy: ScoreRangePolicy,
    import_id: Uuid,
    reporter: &'a R,
    total: u64,
    tally: SkipTally,
}

impl<R: ProgressReporter> NormalizedRows<'_, R> {
    fn skip(&mut self, line: u64, reason: SkipReason) {
        self.tally.record(reason);
        self.reporter.report(ImportEvent::RowSkipped {
            import_id: self.import_id,
            line,
            reason,
        });
    }

    fn fill(&self, summary: &mut ImportSummary) {
        summary.total_records = self.total;
        summary.skipped_records = self.tally.total();
        summary.skip_reasons = self.tally;
    }
}

impl<R: ProgressReporter> Iterator for NormalizedRows<'_, R> {
    type Item = StudentRecord;

    fn next(&mut self) -> Option<StudentRecord> {
        loop {
            let result = self.records.next()?;
            self.total += 1;

            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    self.skip(line, SkipReason::Malformed);
                    continue;
                }
            };

            match normalize(&self.columns.bind(&record), self.policy) {
                Ok(student) => return Some(student),
                Err(reason) => {
                    let line = record.position().map(|p| p.line()).unwrap_or(0);
                    self.skip(line, reason);
                }
            }
        }
    }
}
