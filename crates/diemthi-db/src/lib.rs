//! diemthi DB - PostgreSQL repository layer.
//!
//! This crate provides the repository pattern for exam result persistence.
//!
//! # Overview
//!
//! The main component is [`StudentRepository`], the PostgreSQL implementation
//! of [`diemthi_core::StudentStore`]. Batches are written with a single
//! multi-row `INSERT ... ON CONFLICT (sbd) DO UPDATE` statement, so each batch
//! is atomic and re-importing a candidate replaces the whole row.
//!
//! The `students` table DDL lives in `migrations/` at the workspace root.

mod repository;

pub use repository::{MAX_BATCH_ROWS, StudentRepository};
