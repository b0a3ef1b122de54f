//! CSV import endpoint.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use tracing::info;

use diemthi_core::TracingReporter;

use crate::dto::{IMPORT_FILE_FIELD, ImportResponse, ImportUpload};
use crate::error::ApiError;
use crate::state::AppState;

/// Import an exam results CSV file.
///
/// Rows without a registration number are skipped. Valid rows are written in
/// batches; re-importing a candidate replaces their whole score sheet. If a
/// batch fails, earlier batches stay committed and the error reports how many
/// records were written.
#[utoipa::path(
    post,
    path = "/api/v1/students/import",
    request_body(content = ImportUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import completed", body = ImportResponse),
        (status = 400, description = "Missing, empty or unreadable file"),
        (status = 413, description = "File exceeds the upload limit"),
        (status = 500, description = "Import aborted by a database failure"),
        (status = 503, description = "Server is shutting down"),
    ),
    tag = "import"
)]
pub async fn import_students(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, ApiError> {
    if state.shutdown_token.is_cancelled() {
        return Err(ApiError::ServiceUnavailable(
            "Server is shutting down".to_string(),
        ));
    }

    let mut payload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMPORT_FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        info!(file = ?file_name, bytes = bytes.len(), "Received import upload");
        payload = Some(bytes);
        break;
    }

    let summary = state
        .import_service
        .import_bytes_with_progress(payload.as_deref(), &TracingReporter)
        .await?;

    Ok(Json(ImportResponse::from(summary)))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    }
}
