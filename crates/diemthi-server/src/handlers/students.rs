//! Student lookup and report endpoints.

use axum::{
    Json,
    extract::{Path, State},
};

use diemthi_core::{Group, Subject};

use crate::dto::{GroupTopResponse, LevelCountsResponse, StudentResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Number of candidates returned by the group ranking.
pub const TOP_LIMIT: usize = 10;

/// Get a candidate by registration number.
#[utoipa::path(
    get,
    path = "/api/v1/students/{sbd}",
    params(
        ("sbd" = String, Path, description = "Registration number")
    ),
    responses(
        (status = 200, description = "Student found", body = StudentResponse),
        (status = 404, description = "Student not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "students"
)]
pub async fn get_student(
    State(state): State<AppState>,
    Path(sbd): Path<String>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = state
        .student_repo
        .get_by_sbd(&sbd)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Student not found: {}", sbd.trim())))?;

    Ok(Json(StudentResponse::from(student)))
}

/// Top 10 candidates of an exam group.
///
/// Candidates are ranked by the sum of the group's three subjects. Candidates
/// missing any of them are left out; ties are ordered by registration number.
#[utoipa::path(
    get,
    path = "/api/v1/students/group/{group}",
    params(
        ("group" = String, Path, description = "Exam group: A, A1, B, C or D")
    ),
    responses(
        (status = 200, description = "Ranking", body = GroupTopResponse),
        (status = 400, description = "Unknown group"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "students"
)]
pub async fn top_by_group(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<GroupTopResponse>, ApiError> {
    let group: Group = group.parse()?;
    let ranked = state.student_repo.top_by_group(group, TOP_LIMIT).await?;

    Ok(Json(GroupTopResponse::new(group, ranked)))
}

/// Level distribution of a subject.
#[utoipa::path(
    get,
    path = "/api/v1/students/counts/{subject}",
    params(
        ("subject" = String, Path, description = "Subject column name, e.g. toan or ngu_van")
    ),
    responses(
        (status = 200, description = "Counts per level", body = LevelCountsResponse),
        (status = 400, description = "Unknown subject"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "students"
)]
pub async fn level_counts(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<LevelCountsResponse>, ApiError> {
    let subject: Subject = subject.parse()?;
    let counts = state.student_repo.count_by_level(subject).await?;

    Ok(Json(LevelCountsResponse::new(subject, counts)))
}
