use thiserror::Error;

use crate::import::ImportSummary;

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur in diemthi.
/// It uses the `thiserror` crate for ergonomic error handling and automatic conversion
/// from underlying library errors.
///
/// # Error Conversion
///
/// Most errors automatically convert from their source types using the `#[from]` attribute:
/// - `sqlx::Error` → `AppError::DatabaseError`
/// - `csv::Error` → `AppError::CsvError`
///
/// # Examples
///
/// ```
/// use diemthi_core::error::AppError;
///
/// fn lookup(sbd: &str) -> Result<(), AppError> {
///     Err(AppError::StudentNotFound(sbd.to_string()))
/// }
///
/// assert!(lookup("01000001").is_err());
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database operation failed.
    ///
    /// This error wraps all errors from SQLx database operations, including
    /// connection failures, query errors, and constraint violations.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// The import request carried no file payload.
    #[error("No file uploaded")]
    NoFile,

    /// The uploaded file contained a header but no data rows.
    #[error("CSV file contains no data rows")]
    EmptyFile,

    /// The uploaded file is not valid UTF-8 text.
    #[error("File is not valid UTF-8 (invalid byte at offset {0})")]
    InvalidEncoding(usize),

    /// The CSV reader could not read the header row.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// None of the header cells matches a registration number column.
    #[error("CSV header has no registration number column (expected one of: {0})")]
    MissingIdColumn(String),

    /// A batch write was requested with no records.
    #[error("Cannot upsert an empty batch")]
    EmptyBatch,

    /// A batch would exceed the store's statement size limit.
    #[error("Batch of {rows} records exceeds the maximum of {max} records per statement")]
    BatchTooLarge { rows: usize, max: usize },

    /// A batch write did not complete within the configured timeout.
    #[error("Batch write timed out after {0} seconds")]
    StoreTimeout(u64),

    /// A batch write failed and the remaining batches were not attempted.
    ///
    /// `summary` describes the work done before the failure; its status is
    /// always [`ImportStatus::Failed`](crate::import::ImportStatus::Failed).
    #[error("Import aborted after {committed_records} committed records: {source}")]
    ImportAborted {
        committed_records: u64,
        summary: Box<ImportSummary>,
        source: Box<AppError>,
    },

    /// Student not found in the database.
    #[error("Student not found: {0}")]
    StudentNotFound(String),

    /// Unknown subject column name.
    #[error("Unknown subject: {0}")]
    InvalidSubject(String),

    /// Unknown exam group code.
    #[error("Unknown exam group: {0}")]
    InvalidGroup(String),

    /// Configuration value could not be parsed or is out of range.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true if the error was caused by the caller's input rather than
    /// by the store or the server.
    ///
    /// # Examples
    ///
    /// ```
    /// use diemthi_core::error::AppError;
    ///
    /// assert!(AppError::EmptyFile.is_input_error());
    /// assert!(!AppError::StoreTimeout(30).is_input_error());
    /// ```
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AppError::NoFile
                | AppError::EmptyFile
                | AppError::InvalidEncoding(_)
                | AppError::CsvError(_)
                | AppError::MissingIdColumn(_)
                | AppError::InvalidSubject(_)
                | AppError::InvalidGroup(_)
        )
    }

    /// Returns true if this error is a failure of the store boundary.
    pub fn is_store_error(&self) -> bool {
        self.store_error_kind().is_some()
    }

    /// Short machine-readable kind of a store failure, or None for errors
    /// that did not come from the store.
    ///
    /// # Examples
    ///
    /// ```
    /// use diemthi_core::error::AppError;
    ///
    /// assert_eq!(AppError::StoreTimeout(30).store_error_kind(), Some("timeout"));
    /// assert_eq!(AppError::NoFile.store_error_kind(), None);
    /// ```
    pub fn store_error_kind(&self) -> Option<&'static str> {
        match self {
            AppError::DatabaseError(_) => Some("database"),
            AppError::BatchTooLarge { .. } => Some("batch_too_large"),
            AppError::StoreTimeout(_) => Some("timeout"),
            AppError::EmptyBatch => Some("empty_batch"),
            _ => None,
        }
    }

    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::DatabaseError(e) => {
                if e.to_string().contains("connection") {
                    "Cannot connect to database. Is PostgreSQL running?\n   Try: docker-compose up -d".to_string()
                } else {
                    format!("Database error: {}", e)
                }
            }
            AppError::InvalidEncoding(_) => {
                "The file is not UTF-8 text.\n   Re-export the CSV with UTF-8 encoding.".to_string()
            }
            AppError::MissingIdColumn(expected) => {
                format!(
                    "The CSV header has no registration number column.\n   Expected one of: {}",
                    expected
                )
            }
            AppError::StoreTimeout(secs) => {
                format!(
                    "A batch write timed out after {} seconds.\n   Try a smaller --batch-size.",
                    secs
                )
            }
            AppError::ImportAborted {
                committed_records,
                source,
                ..
            } => {
                format!(
                    "Import failed: {}\n   {} records were committed before the failure.",
                    source.user_message(),
                    committed_records
                )
            }
            AppError::ConfigError(msg) => {
                format!(
                    "Configuration error: {}\n   Check your environment variables.",
                    msg
                )
            }
            _ => self.to_string(),
        }
    }
}
