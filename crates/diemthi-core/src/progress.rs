//! Progress reporting for imports.
//!
//! [`ImportService`](crate::ImportService) emits [`ImportEvent`]s instead of
//! logging directly, so the CLI and the server can decide where progress goes.

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::import::ImportSummary;
use crate::normalize::SkipReason;

/// Something that happened during an import.
#[derive(Debug)]
pub enum ImportEvent<'a> {
    /// The header was read and the batch loop is about to start.
    Started {
        import_id: Uuid,
        columns: usize,
        batch_size: usize,
    },
    /// A row was dropped by the normalizer.
    RowSkipped {
        import_id: Uuid,
        line: u64,
        reason: SkipReason,
    },
    /// A batch was written.
    BatchCommitted {
        import_id: Uuid,
        batch: usize,
        records: usize,
        rows_affected: u64,
    },
    /// A batch write failed; no further batches will be attempted.
    BatchFailed {
        import_id: Uuid,
        batch: usize,
        records: usize,
        error: &'a str,
    },
    /// The import finished, successfully or not.
    Finished { summary: &'a ImportSummary },
}

/// Receives import events.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ImportEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _event: ImportEvent<'_>) {}
}

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, event: ImportEvent<'_>) {
        match event {
            ImportEvent::Started {
                import_id,
                columns,
                batch_size,
            } => {
                info!(%import_id, columns, batch_size, "Import started");
            }
            ImportEvent::RowSkipped {
                import_id,
                line,
                reason,
            } => {
                debug!(%import_id, line, ?reason, "Row skipped");
            }
            ImportEvent::BatchCommitted {
                import_id,
                batch,
                records,
                rows_affected,
            } => {
                info!(%import_id, batch, records, rows_affected, "Batch committed");
            }
            ImportEvent::BatchFailed {
                import_id,
                batch,
                records,
                error,
            } => {
                error!(%import_id, batch, records, error, "Batch failed, aborting import");
            }
            ImportEvent::Finished { summary } => {
                info!(
                    import_id = %summary.import_id,
                    status = ?summary.status,
                    total = summary.total_records,
                    imported = summary.imported_count,
                    skipped = summary.skipped_records,
                    batches = summary.batches_committed,
                    elapsed_ms = summary.elapsed_ms,
                    "Import finished"
                );
            }
        }
    }
}
