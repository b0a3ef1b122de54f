//! Response DTOs for API endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use diemthi_core::{
    Group, ImportSummary, LevelCounts, RankedStudent, SkipTally, StudentRecord, Subject,
};

// =============================================================================
// Health
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("healthy" or "unhealthy")
    pub status: String,
    /// Server version
    pub version: String,
    /// Database connectivity status
    pub database: ServiceStatus,
}

/// Status of an individual service component.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    /// Whether the service is reachable
    pub healthy: bool,
    /// Optional message (e.g., error details)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Students
// =============================================================================

/// Exam results of one candidate.
#[derive(Debug, Serialize, ToSchema)]
pub struct StudentResponse {
    /// Registration number
    pub sbd: String,
    pub toan: Option<f64>,
    pub ngu_van: Option<f64>,
    pub ngoai_ngu: Option<f64>,
    pub vat_li: Option<f64>,
    pub hoa_hoc: Option<f64>,
    pub sinh_hoc: Option<f64>,
    pub lich_su: Option<f64>,
    pub dia_li: Option<f64>,
    pub gdcd: Option<f64>,
    /// Foreign language code (e.g. "N1")
    pub ma_ngoai_ngu: Option<String>,
}

impl From<StudentRecord> for StudentResponse {
    fn from(s: StudentRecord) -> Self {
        Self {
            sbd: s.sbd,
            toan: s.toan,
            ngu_van: s.ngu_van,
            ngoai_ngu: s.ngoai_ngu,
            vat_li: s.vat_li,
            hoa_hoc: s.hoa_hoc,
            sinh_hoc: s.sinh_hoc,
            lich_su: s.lich_su,
            dia_li: s.dia_li,
            gdcd: s.gdcd,
            ma_ngoai_ngu: s.ma_ngoai_ngu,
        }
    }
}

/// One entry of a group ranking.
#[derive(Debug, Serialize, ToSchema)]
pub struct RankedStudentDto {
    /// 1-based position in the ranking
    pub rank: usize,
    /// Registration number
    pub sbd: String,
    /// Sum of the group's three subject scores
    pub total: f64,
    /// Full score sheet
    pub scores: StudentResponse,
}

/// Top candidates of an exam group.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupTopResponse {
    /// Group code (A, A1, B, C, D)
    pub group: String,
    /// Subjects summed for the ranking
    pub subjects: Vec<String>,
    /// Number of entries returned
    pub count: usize,
    pub students: Vec<RankedStudentDto>,
}

impl GroupTopResponse {
    pub fn new(group: Group, ranked: Vec<RankedStudent>) -> Self {
        let students: Vec<RankedStudentDto> = ranked
            .into_iter()
            .enumerate()
            .map(|(i, r)| RankedStudentDto {
                rank: i + 1,
                sbd: r.student.sbd.clone(),
                total: r.total,
                scores: StudentResponse::from(r.student),
            })
            .collect();

        Self {
            group: group.to_string(),
            subjects: group.subjects().iter().map(|s| s.to_string()).collect(),
            count: students.len(),
            students,
        }
    }
}

/// Score level distribution of one subject.
#[derive(Debug, Serialize, ToSchema)]
pub struct LevelCountsResponse {
    /// Subject column name
    pub subject: String,
    /// Scores >= 8
    pub excellent: i64,
    /// 6 <= score < 8
    pub good: i64,
    /// 4 <= score < 6
    pub average: i64,
    /// Scores < 4
    pub weak: i64,
    /// Candidates with a score in this subject
    pub total: i64,
}

impl LevelCountsResponse {
    pub fn new(subject: Subject, counts: LevelCounts) -> Self {
        Self {
            subject: subject.to_string(),
            excellent: counts.excellent,
            good: counts.good,
            average: counts.average,
            weak: counts.weak,
            total: counts.total(),
        }
    }
}

// =============================================================================
// Import
// =============================================================================

/// Skipped rows by reason.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkipReasonsDto {
    /// Rows without a registration number
    pub missing_id: u64,
    /// Rows rejected for an out-of-range score
    pub score_out_of_range: u64,
    /// Rows the CSV reader could not decode
    pub malformed: u64,
}

impl From<SkipTally> for SkipReasonsDto {
    fn from(t: SkipTally) -> Self {
        Self {
            missing_id: t.missing_id,
            score_out_of_range: t.score_out_of_range,
            malformed: t.malformed,
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub message: String,
    pub import_id: Uuid,
    /// Records accepted and written
    pub imported_count: u64,
    /// Data rows read (header excluded)
    pub total_records: u64,
    pub skipped_records: u64,
    pub skip_reasons: SkipReasonsDto,
    pub batches_committed: usize,
    /// Rows inserted or updated by the database
    pub rows_affected: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl From<ImportSummary> for ImportResponse {
    fn from(s: ImportSummary) -> Self {
        Self {
            message: format!(
                "Imported {} of {} records ({} skipped)",
                s.imported_count, s.total_records, s.skipped_records
            ),
            import_id: s.import_id,
            imported_count: s.imported_count,
            total_records: s.total_records,
            skipped_records: s.skipped_records,
            skip_reasons: SkipReasonsDto::from(s.skip_reasons),
            batches_committed: s.batches_committed,
            rows_affected: s.rows_affected,
            started_at: s.started_at,
            elapsed_ms: s.elapsed_ms,
        }
    }
}
