//! Request DTOs for API endpoints.

use utoipa::ToSchema;

/// Name of the multipart field carrying the CSV file.
pub const IMPORT_FILE_FIELD: &str = "file";

/// Multipart body of an import request. Only used for the OpenAPI schema;
/// the handler reads the multipart stream directly.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImportUpload {
    /// CSV file with a header row; `sbd` (or an alias) is required
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
