//! Configuration module for environment variable parsing.
//!
//! Every setting comes from the environment. Secrets are wrapped in
//! [`Secret`] so the whole struct can be logged with `?config` safely.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::credentials::{require_token, Secret};
use crate::error::Result;
use crate::mapping::{parse_mappings, FieldMapping};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Base URL of the eSignatures.com API
    pub esign_api_url: String,

    /// API token, also used as the webhook HMAC key
    pub esign_api_token: Option<Secret>,

    /// Optional timeout for provider calls; the HTTP client default otherwise
    pub request_timeout_ms: Option<u64>,

    /// Ordered (document field → placeholder) rows
    pub placeholder_mappings: Vec<FieldMapping>,

    /// Role whose members are notified when a document is signed
    pub notify_role: String,

    /// Human label for the document type ("Quotation")
    pub document_label: String,

    /// Print service endpoint returning document PDFs
    pub print_url: Option<String>,

    /// Path to a JSON file seeding the in-memory host store
    pub seed_path: Option<String>,

    // =========================================================================
    // Outbound Mail
    // =========================================================================

    /// Mailgun API base URL
    pub mailgun_api_url: String,

    /// Mailgun sending key
    pub mailgun_api_key: Option<Secret>,

    /// Mailgun sending domain
    pub mailgun_domain: Option<String>,

    /// From address for outbound mail
    pub mail_from: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            esign_api_url: "https://esignatures.com".to_string(),
            esign_api_token: None,
            request_timeout_ms: None,
            placeholder_mappings: Vec::new(),
            notify_role: "e-signature".to_string(),
            document_label: "Quotation".to_string(),
            print_url: None,
            seed_path: None,
            mailgun_api_url: "https://api.mailgun.net".to_string(),
            mailgun_api_key: None,
            mailgun_domain: None,
            mail_from: "noreply@localhost".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_number("PORT").unwrap_or(defaults.port),

            esign_api_url: env::var("ESIGN_API_URL").unwrap_or(defaults.esign_api_url),

            esign_api_token: env::var("ESIGN_API_TOKEN").ok().and_then(Secret::new),

            request_timeout_ms: parse_number("REQUEST_TIMEOUT_MS"),

            placeholder_mappings: parse_csv("ESIGN_PLACEHOLDER_MAPPINGS")
                .map(parse_mappings)
                .unwrap_or_default(),

            notify_role: non_empty("ESIGN_NOTIFY_ROLE").unwrap_or(defaults.notify_role),

            document_label: non_empty("ESIGN_DOCUMENT_LABEL").unwrap_or(defaults.document_label),

            print_url: non_empty("ESIGN_PRINT_URL"),

            seed_path: non_empty("ESIGN_SEED_PATH"),

            mailgun_api_url: non_empty("MAILGUN_API_URL").unwrap_or(defaults.mailgun_api_url),

            mailgun_api_key: env::var("MAILGUN_API_KEY").ok().and_then(Secret::new),

            mailgun_domain: non_empty("MAILGUN_DOMAIN"),

            mail_from: non_empty("MAIL_FROM").unwrap_or(defaults.mail_from),
        }
    }

    /// The provider API token, or a configuration error when unset.
    pub fn api_token(&self) -> Result<&Secret> {
        require_token(self.esign_api_token.as_ref())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Whether Mailgun delivery is fully configured.
    pub fn mailgun_enabled(&self) -> bool {
        self.mailgun_api_key.is_some() && self.mailgun_domain.is_some()
    }
}

/// Parse a numeric variable, warning on malformed values.
fn parse_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            None
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of strings.
fn parse_csv(name: &str) -> Option<Vec<String>> {
    env::var(name).ok().map(|raw| {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}
