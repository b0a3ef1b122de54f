//! Router configuration and route composition.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ServerConfig;
use crate::handlers::{health, import, students};
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    // Static segments take priority over `:sbd`.
    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/students/import",
            post(import::import_students).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .route("/students/group/:group", get(students::top_by_group))
        .route("/students/counts/:subject", get(students::level_counts))
        .route("/students/:sbd", get(students::get_student));

    let cors_layer = build_cors_layer(&config.cors_origins);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware layers (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// CORS for browser uploads. A `"*"` entry allows any origin; otherwise
/// `origins` is a comma separated list and unparsable entries are dropped
/// with a warning.
fn build_cors_layer(origins: &str) -> CorsLayer {
    let allow_origin = if origins.split(',').any(|origin| origin.trim() == "*") {
        AllowOrigin::any()
    } else {
        let allowed: Vec<HeaderValue> = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(allowed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(60 * 60))
}
