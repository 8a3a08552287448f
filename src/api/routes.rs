//! API Routes
//!
//! Configures the Axum router: diagnostic endpoints plus the intercepting
//! fallback.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, intercept_handler, status_handler, AppState};

/// Creates the main router.
///
/// # Endpoints
/// - `GET /__offline/health` - Health check endpoint
/// - `GET /__offline/status` - Lifecycle phase and cache statistics
/// - anything else - Routed through the offline controller
///
/// # Middleware
/// - CORS: Diagnostic endpoints only, any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let diagnostics = Router::new()
        .route("/__offline/health", get(health_handler))
        .route("/__offline/status", get(status_handler))
        .layer(cors);

    Router::new()
        .merge(diagnostics)
        .fallback(intercept_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
