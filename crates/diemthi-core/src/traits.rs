//! Trait definitions for external dependencies.
//!
//! The import pipeline and the read endpoints only talk to persistence through
//! [`StudentStore`], so the core can be tested against an in-memory store and
//! deployed against PostgreSQL.
//!
//! # Example
//!
//! ```
//! use diemthi_core::traits::StudentStore;
//! use diemthi_core::{AppError, Group, RankedStudent};
//!
//! async fn leaderboard<S: StudentStore>(store: &S) -> Result<Vec<RankedStudent>, AppError> {
//!     store.top_by_group(Group::A, 10).await
//! }
//! ```

use std::future::Future;

use crate::{AppError, Group, LevelCounts, RankedStudent, StudentRecord, Subject};

/// Store for exam result persistence and retrieval.
pub trait StudentStore: Send + Sync + Clone {
    /// Inserts every record, replacing all score and language columns of
    /// rows whose `sbd` already exists.
    ///
    /// Implementations must write the batch as one atomic statement and may
    /// assume `records` is non-empty and free of duplicate `sbd`s.
    ///
    /// # Returns
    ///
    /// The number of rows inserted or updated.
    fn upsert_batch(
        &self,
        records: &[StudentRecord],
    ) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Retrieves one candidate by registration number.
    fn get_by_sbd(
        &self,
        sbd: &str,
    ) -> impl Future<Output = Result<Option<StudentRecord>, AppError>> + Send;

    /// Returns the `limit` candidates with the highest total over the group's
    /// subjects. Candidates missing any of those scores are excluded; ties are
    /// ordered by `sbd`.
    fn top_by_group(
        &self,
        group: Group,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RankedStudent>, AppError>> + Send;

    /// Counts candidates per [`ScoreLevel`](crate::ScoreLevel) for a subject.
    /// Missing scores are not counted.
    fn count_by_level(
        &self,
        subject: Subject,
    ) -> impl Future<Output = Result<LevelCounts, AppError>> + Send;

    /// Checks that the store is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}
