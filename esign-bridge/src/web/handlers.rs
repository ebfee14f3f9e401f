//! HTTP endpoint handlers.
//!
//! The webhook endpoint always answers 200 with a JSON body describing the
//! outcome. The user-facing endpoints map [`EsignError`] to HTTP statuses.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};

use crate::client::{EsignClient, TemplateOption};
use crate::error::EsignError;
use crate::host::Host;
use crate::webhook::{process_webhook, WebhookResponse, WebhookSettings, SIGNATURE_HEADER};
use crate::workflow::{send_for_signature, SendConfirmation, SendRequest};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: EsignClient,
    pub host: Host,
}

impl AppState {
    pub fn new(config: Config, client: EsignClient, host: Host) -> Self {
        Self {
            config: Arc::new(config),
            client,
            host,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Error body for the user-facing endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl EsignError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EsignError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EsignError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EsignError::NotFound(_) => StatusCode::NOT_FOUND,
            EsignError::Integration { .. } | EsignError::Transport(_) => StatusCode::BAD_GATEWAY,
            EsignError::Security(_) => StatusCode::UNAUTHORIZED,
            EsignError::Parse(_) => StatusCode::BAD_REQUEST,
            EsignError::Host(_) | EsignError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EsignError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status_code = status.as_u16(), error = %self, "request_failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Templates
// =============================================================================

/// List provider templates. An empty list means none are available.
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateOption>>, EsignError> {
    let token = state.config.api_token()?;
    Ok(Json(state.client.list_templates(token).await))
}

// =============================================================================
// Send for Signature
// =============================================================================

/// Send a document for signature.
pub async fn send_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Option<Json<SendRequest>>,
) -> Result<Json<SendConfirmation>, EsignError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    info!(document = %name, resend = request.resend, "send_for_signature_received");

    let confirmation =
        send_for_signature(&state.config, &state.client, &state.host, &name, request).await?;

    Ok(Json(confirmation))
}

// =============================================================================
// eSignatures.com Webhook
// =============================================================================

/// Webhook endpoint.
///
/// The raw body is taken as bytes so the HMAC covers exactly what was sent.
pub async fn esignature_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "esignature_webhook_received"
    );

    let settings = WebhookSettings {
        token: state.config.esign_api_token.as_ref(),
        notify_role: &state.config.notify_role,
        document_label: &state.config.document_label,
    };

    let response: WebhookResponse = process_webhook(
        settings,
        &state.host,
        &body,
        signature,
        Utc::now().date_naive(),
    )
    .await;

    (StatusCode::OK, Json(response))
}
