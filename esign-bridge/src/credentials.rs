//! Secret handling for provider credentials.
//!
//! The eSignatures.com API token doubles as the query-string credential for
//! outbound calls and as the HMAC key for inbound webhooks. It is carried in a
//! [`Secret`] so it never ends up in logs by accident.

use std::fmt;

use crate::error::{EsignError, Result};

/// A secret string with a redacted `Debug` and no `Display`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a raw value. Blank values are treated as unset.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            None
        } else {
            Some(Secret(raw))
        }
    }

    /// Access the raw value. Only call this where the value leaves the process.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Resolve the provider API token, failing when it has not been configured.
pub fn require_token(token: Option<&Secret>) -> Result<&Secret> {
    token.ok_or_else(|| {
        EsignError::Configuration("E-signature API token not configured.".to_string())
    })
}
