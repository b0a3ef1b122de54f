//! Student repository for PostgreSQL.

use diemthi_core::error::AppError;
use diemthi_core::models::{Group, LevelCounts, RankedStudent, StudentRecord, Subject};
use diemthi_core::traits::StudentStore;
use sqlx::{PgPool, Pool, Postgres, QueryBuilder};
use tracing::debug;

/// Column list for SELECT and INSERT. Must remain a const literal to ensure SQL
/// safety since format!() bypasses sqlx compile-time validation.
const STUDENT_COLUMNS: &str =
    "sbd, toan, ngu_van, ngoai_ngu, vat_li, hoa_hoc, sinh_hoc, lich_su, dia_li, gdcd, ma_ngoai_ngu";

/// Bind parameters bound per record by [`StudentRepository::upsert_batch`].
const COLUMNS_PER_ROW: usize = 11;

/// PostgreSQL rejects statements with more bind parameters than this.
const MAX_BIND_PARAMS: usize = 65_535;

/// Largest batch that fits in one upsert statement.
pub const MAX_BATCH_ROWS: usize = MAX_BIND_PARAMS / COLUMNS_PER_ROW;

/// Repository for exam result persistence in PostgreSQL.
///
/// # Examples
///
/// ```no_run
/// use sqlx::postgres::PgPoolOptions;
/// use diemthi_db::StudentRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPoolOptions::new()
///     .max_connections(5)
///     .connect("postgresql://localhost/diemthi")
///     .await?;
///
/// let repo = StudentRepository::new(pool);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StudentRepository {
    pool: Pool<Postgres>,
}

impl StudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or fully replaces every record in one statement. Returns the
    /// number of rows inserted or updated.
    ///
    /// `records` must not repeat an `sbd`: PostgreSQL refuses to update the
    /// same row twice within one `ON CONFLICT DO UPDATE` statement.
    pub async fn upsert_batch(&self, records: &[StudentRecord]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Err(AppError::EmptyBatch);
        }
        if records.len() > MAX_BATCH_ROWS {
            return Err(AppError::BatchTooLarge {
                rows: records.len(),
                max: MAX_BATCH_ROWS,
            });
        }

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("INSERT INTO students ({}) ", STUDENT_COLUMNS));
        qb.push_values(records, |mut b, r| {
            b.push_bind(&r.sbd)
                .push_bind(r.toan)
                .push_bind(r.ngu_van)
                .push_bind(r.ngoai_ngu)
                .push_bind(r.vat_li)
                .push_bind(r.hoa_hoc)
                .push_bind(r.sinh_hoc)
                .push_bind(r.lich_su)
                .push_bind(r.dia_li)
                .push_bind(r.gdcd)
                .push_bind(&r.ma_ngoai_ngu);
        });
        qb.push(
            " ON CONFLICT (sbd)
              DO UPDATE SET toan = EXCLUDED.toan,
                             ngu_van = EXCLUDED.ngu_van,
                             ngoai_ngu = EXCLUDED.ngoai_ngu,
                             vat_li = EXCLUDED.vat_li,
                             hoa_hoc = EXCLUDED.hoa_hoc,
                             sinh_hoc = EXCLUDED.sinh_hoc,
                             lich_su = EXCLUDED.lich_su,
                             dia_li = EXCLUDED.dia_li,
                             gdcd = EXCLUDED.gdcd,
                             ma_ngoai_ngu = EXCLUDED.ma_ngoai_ngu",
        );

        let result = qb
            .build()
            .persistent(false)
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        debug!(
            records = records.len(),
            rows_affected = result.rows_affected(),
            "Upserted student batch"
        );
        Ok(result.rows_affected())
    }

    pub async fn get_by_sbd(&self, sbd: &str) -> Result<Option<StudentRecord>, AppError> {
        let query = format!("SELECT {} FROM students WHERE sbd = $1", STUDENT_COLUMNS);
        let result = sqlx::query_as::<_, StudentRecord>(&query)
            .bind(sbd.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(result)
    }

    /// Top candidates by the sum of the group's subjects, highest first.
    pub async fn top_by_group(
        &self,
        group: Group,
        limit: usize,
    ) -> Result<Vec<RankedStudent>, AppError> {
        let [a, b, c] = group.subjects().map(|s| s.column());
        // Column names come from Subject::column(), never from user input.
        let query = format!(
            "SELECT {columns} FROM students
             WHERE {a} IS NOT NULL AND {b} IS NOT NULL AND {c} IS NOT NULL
             ORDER BY ({a} + {b} + {c}) DESC, sbd ASC
             LIMIT $1",
            columns = STUDENT_COLUMNS,
        );

        let rows = sqlx::query_as::<_, StudentRecord>(&query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(rows
            .into_iter()
            .filter_map(|student| {
                student
                    .group_total(group)
                    .map(|total| RankedStudent { student, total })
            })
            .collect())
    }

    /// Level distribution of one subject. Null scores are not counted.
    pub async fn count_by_level(&self, subject: Subject) -> Result<LevelCounts, AppError> {
        let col = subject.column();
        let query = format!(
            "SELECT
                COUNT(*) FILTER (WHERE {col} >= 8),
                COUNT(*) FILTER (WHERE {col} >= 6 AND {col} < 8),
                COUNT(*) FILTER (WHERE {col} >= 4 AND {col} < 6),
                COUNT(*) FILTER (WHERE {col} < 4)
             FROM students"
        );

        let (excellent, good, average, weak): (i64, i64, i64, i64) = sqlx::query_as(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;

        Ok(LevelCounts {
            excellent,
            good,
            average,
            weak,
        })
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(AppError::DatabaseError)?;
        Ok(())
    }
}

// =============================================================================
// Trait Implementation: StudentStore
// =============================================================================

impl StudentStore for StudentRepository {
    async fn upsert_batch(&self, records: &[StudentRecord]) -> Result<u64, AppError> {
        StudentRepository::upsert_batch(self, records).await
    }

    async fn get_by_sbd(&self, sbd: &str) -> Result<Option<StudentRecord>, AppError> {
        StudentRepository::get_by_sbd(self, sbd).await
    }

    async fn top_by_group(&self, group: Group, limit: usize) -> Result<Vec<RankedStudent>, AppError> {
        StudentRepository::top_by_group(self, group, limit).await
    }

    async fn count_by_level(&self, subject: Subject) -> Result<LevelCounts, AppError> {
        StudentRepository::count_by_level(self, subject).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        StudentRepository::health_check(self).await
    }
}
