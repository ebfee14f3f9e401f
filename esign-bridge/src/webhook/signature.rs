//! eSignatures.com webhook signature verification.
//!
//! The provider signs the raw request body with HMAC-SHA256 keyed by the API
//! token and sends the hex digest in `X-Signature-SHA256`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::{EsignError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC of the body.
pub const SIGNATURE_HEADER: &str = "X-Signature-SHA256";

/// Hex HMAC-SHA256 of `body` keyed by `key`.
pub fn compute_signature(key: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|_| EsignError::Configuration("invalid webhook signing key".to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify `signature` against the body.
///
/// Returns `Security` errors whose message is safe to echo back to the caller.
pub fn verify_signature(key: &str, body: &[u8], signature: Option<&str>) -> Result<()> {
    let signature = match signature.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!(body_length = body.len(), "webhook_signature_missing");
            return Err(EsignError::Security("Missing signature".to_string()));
        }
    };

    let expected = compute_signature(key, body)?;
    let provided = signature.to_ascii_lowercase();

    // Constant-time comparison to prevent timing attacks
    let valid: bool = expected.as_bytes().ct_eq(provided.as_bytes()).into();

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            "webhook_signature_mismatch"
        );
        return Err(EsignError::Security(
            "Unauthorized: Invalid signature".to_string(),
        ));
    }

    Ok(())
}
