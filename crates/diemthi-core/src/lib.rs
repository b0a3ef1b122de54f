//! diemthi Core - Domain types, import pipeline, and store traits.
//!
//! This crate provides the core functionality for diemthi, including:
//!
//! - **Domain models**: [`StudentRecord`], [`Subject`], [`Group`], [`LevelCounts`]
//! - **Import pipeline**: row normalization, batch assembly, bulk upsert, and the
//!   [`ImportService`] that drives them over a CSV file
//! - **Traits**: [`StudentStore`] for dependency injection of the persistence layer
//! - **Progress reporting**: [`ProgressReporter`] trait for decoupled logging/UI
//!
//! # Architecture
//!
//! This crate is reusable by different frontends (CLI, server). Business logic
//! talks to PostgreSQL only through [`StudentStore`], implemented by
//! `diemthi_db::StudentRepository`.
//!
//! # Example
//!
//! ```ignore
//! use diemthi_core::{ImportConfig, ImportService, TracingReporter};
//!
//! let service = ImportService::with_config(repo, ImportConfig::default().with_batch_size(2000));
//! let summary = service
//!     .import_bytes_with_progress(Some(&bytes), &TracingReporter)
//!     .await?;
//! println!("{} imported, {} skipped", summary.imported_count, summary.skipped_records);
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod traits;
pub mod upsert;

// Configuration
pub use config::{DEFAULT_BATCH_SIZE, DbConfig, ImportConfig, ScoreRangePolicy};

// Error handling
pub use error::AppError;

// Domain models
pub use models::{Group, LevelCounts, RankedStudent, ScoreLevel, StudentRecord, Subject};

// Import pipeline
pub use batch::{chunk, collapse_duplicates};
pub use import::{ImportService, ImportStatus, ImportSummary};
pub use normalize::{SkipReason, SkipTally, normalize, parse_nullable_float};
pub use upsert::UpsertExecutor;

// Progress reporting
pub use progress::{ImportEvent, ProgressReporter, SilentReporter, TracingReporter};

// Traits for dependency injection
pub use traits::StudentStore;
