//! diemthi Server - REST API for exam results
//!
//! This crate provides an HTTP API on top of diemthi-core:
//!
//! - **Import**: Bulk upload of exam result CSV files
//! - **Students**: Lookup by registration number
//! - **Reports**: Group rankings and per-subject level distributions
//!
//! # API Documentation
//!
//! When running the server, interactive API documentation is available
//! at `/swagger-ui`.

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;
