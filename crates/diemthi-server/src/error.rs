use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use diemthi_core::ImportSummary;
use diemthi_core::error::AppError;

/// API error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// The database failed or a write timed out. `kind` comes from
    /// [`AppError::store_error_kind`].
    #[error("Store error: {message}")]
    Store { message: String, kind: &'static str },

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An import stopped on a store failure after `committed_records` were written.
    #[error("Import failed: {message}")]
    ImportFailed {
        message: String,
        kind: Option<&'static str>,
        committed_records: u64,
        summary: Box<ImportSummary>,
    },
}

/// JSON error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Store failure kind, e.g. `timeout` or `database`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Work done before an import failed
    #[serde(flatten)]
    pub import: Option<AbortedImport>,
}

/// Counters of an import that stopped part way.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortedImport {
    pub import_id: Uuid,
    /// Records already written when the import failed
    pub committed_records: u64,
    pub total_records: u64,
    pub skipped_records: u64,
    /// Records of the batch whose write failed
    pub failed_records: u64,
    pub batches_committed: usize,
}

impl AbortedImport {
    fn new(committed_records: u64, summary: &ImportSummary) -> Self {
        Self {
            import_id: summary.import_id,
            committed_records,
            total_records: summary.total_records,
            skipped_records: summary.skipped_records,
            failed_records: summary.failed_records,
            batches_committed: summary.batches_committed,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Store { .. } | ApiError::ImportFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn body(self) -> ErrorResponse {
        let (error_type, message, details, import) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None, None),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg, None, None),
            ApiError::Internal(msg) => ("internal_error", msg, None, None),
            ApiError::Store { message, kind } => ("store_error", message, Some(kind), None),
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg, None, None),
            ApiError::ImportFailed {
                message,
                kind,
                committed_records,
                summary,
            } => (
                "import_failed",
                message,
                kind,
                Some(AbortedImport::new(committed_records, &summary)),
            ),
        };

        ErrorResponse {
            error: error_type.to_string(),
            message,
            details: details.map(str::to_string),
            import,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

/// Database errors can carry connection strings and SQL; clients only see
/// the kind.
fn public_message(err: &AppError) -> String {
    match err {
        AppError::DatabaseError(_) => "Database error".to_string(),
        other => other.to_string(),
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::StudentNotFound(sbd) => {
                ApiError::NotFound(format!("Student not found: {}", sbd))
            }
            AppError::ImportAborted {
                committed_records,
                summary,
                source,
            } => ApiError::ImportFailed {
                message: public_message(&source),
                kind: source.store_error_kind(),
                committed_records,
                summary,
            },
            err if err.is_store_error() => ApiError::Store {
                message: public_message(&err),
                kind: err.store_error_kind().unwrap_or("database"),
            },
            err if err.is_input_error() => ApiError::BadRequest(err.to_string()),
            err => ApiError::Internal(err.to_string()),
        }
    }
}
