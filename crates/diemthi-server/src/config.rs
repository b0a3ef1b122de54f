use std::time::Duration;

use clap::Parser;

use diemthi_core::{AppError, DEFAULT_BATCH_SIZE, DbConfig, ImportConfig, ScoreRangePolicy};
use diemthi_db::MAX_BATCH_ROWS;

/// Default request body limit for CSV uploads (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Server configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "diemthi-server")]
#[command(author, version, about = "REST API server for diemthi exam results")]
pub struct ServerConfig {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Server port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Maximum database connections in the pool
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = DbConfig::default().max_connections)]
    pub db_max_connections: u32,

    /// Records per upsert statement during imports
    #[arg(long, env = "IMPORT_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    pub import_batch_size: usize,

    /// Seconds a single batch write may take before the import is aborted
    #[arg(long, env = "IMPORT_BATCH_TIMEOUT_SECS", default_value = "30")]
    pub import_batch_timeout_secs: u64,

    /// Handling of scores outside [0, 10]: passthrough, reject or clamp
    #[arg(long, env = "SCORE_POLICY", default_value = "passthrough")]
    pub score_policy: ScoreRangePolicy,

    /// Allowed CORS origins, comma separated, or "*"
    #[arg(long, env = "CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Checks values clap cannot check on its own.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.import_batch_size == 0 || self.import_batch_size > MAX_BATCH_ROWS {
            return Err(AppError::ConfigError(format!(
                "IMPORT_BATCH_SIZE must be between 1 and {}, got {}",
                MAX_BATCH_ROWS, self.import_batch_size
            )));
        }
        if self.import_batch_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "IMPORT_BATCH_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn import_config(&self) -> ImportConfig {
        ImportConfig::default()
            .with_batch_size(self.import_batch_size)
            .with_batch_timeout(Duration::from_secs(self.import_batch_timeout_secs))
            .with_score_policy(self.score_policy)
    }
}
