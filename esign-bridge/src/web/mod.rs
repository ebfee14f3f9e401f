//! Web server module.
//!
//! Routes:
//! - `GET /health`
//! - `GET /api/templates`: provider templates for the document form
//! - `POST /api/documents/:name/signature`: send a document for signature
//! - `POST /webhooks/esignature`: signed-contract callback from the provider

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    esignature_webhook, health, list_templates, send_document, AppState, ErrorResponse,
    HealthResponse,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/templates", get(list_templates))
        .route("/api/documents/:name/signature", post(send_document))
        .route("/webhooks/esignature", post(esignature_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
