use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use diemthi_core::{ImportConfig, ImportService};
use diemthi_db::StudentRepository;

/// Shared application state for all handlers.
///
/// This is wrapped in Arc internally by Axum when using `with_state()`,
/// so all fields must implement Clone (which they do via internal `Arc<Pool>`).
#[derive(Clone)]
pub struct AppState {
    /// Import service for CSV uploads
    pub import_service: ImportService<StudentRepository>,

    /// Student repository for read queries
    pub student_repo: StudentRepository,

    /// Cancelled once shutdown starts; new imports are refused after that
    pub shutdown_token: CancellationToken,
}

impl AppState {
    /// Creates a new application state with all services initialized.
    pub fn new(pool: PgPool, import_config: ImportConfig, shutdown_token: CancellationToken) -> Self {
        let student_repo = StudentRepository::new(pool);

        Self {
            import_service: ImportService::with_config(student_repo.clone(), import_config),
            student_repo,
            shutdown_token,
        }
    }
}
