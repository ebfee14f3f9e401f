//! Error taxonomy shared by every component.

use thiserror::Error;

/// Errors raised by the integration layer.
#[derive(Debug, Error)]
pub enum EsignError {
    /// Required configuration (API token, print service, ...) is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller input is missing or the document is in the wrong state.
    #[error("validation error: {0}")]
    Validation(String),

    /// The provider answered with a non-success or unusable response.
    #[error("e-signature API returned {status}: {body}")]
    Integration { status: u16, body: String },

    /// The provider could not be reached.
    #[error("e-signature API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Webhook authentication failed.
    #[error("webhook rejected: {0}")]
    Security(String),

    /// Webhook body is not valid JSON.
    #[error("invalid webhook payload: {0}")]
    Parse(#[from] serde_json::Error),

    /// A referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A host collaborator (store, directory, renderer) failed.
    #[error("host error: {0}")]
    Host(String),

    /// Outbound mail could not be delivered.
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

pub type Result<T> = std::result::Result<T, EsignError>;
