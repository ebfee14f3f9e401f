//! esign-bridge - eSignatures.com integration for quotation documents.
//!
//! This library provides the modules behind two binaries:
//! - `esign-bridge`: web server for sending documents and receiving webhooks
//! - `esign-templates`: prints the provider's template list
//!
//! ## Flows
//!
//! ```text
//! Send:    user → workflow → placeholder mapping → contracts API → signing email
//! Webhook: provider → HMAC check → document marked signed → role notifications
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod document;
pub mod error;
pub mod host;
pub mod mail;
pub mod mapping;
pub mod web;
pub mod webhook;
pub mod workflow;

// Re-export commonly used types
pub use client::{EsignClient, TemplateOption};
pub use config::Config;
pub use credentials::Secret;
pub use document::SignableDocument;
pub use error::{EsignError, Result};
pub use host::{Host, InMemoryHost};
pub use mapping::{build_placeholder_fields, FieldMapping, PlaceholderField};
pub use web::AppState;
pub use webhook::{process_webhook, WebhookResponse, WebhookSettings};
pub use workflow::{send_for_signature, SendConfirmation, SendRequest};
