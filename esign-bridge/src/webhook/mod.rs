//! Inbound eSignatures.com webhook.
//!
//! Only the `contract-signed` event is acted upon. Authentication is the
//! HMAC signature alone; see [`signature`].

pub mod handler;
pub mod payload;
pub mod signature;

pub use handler::{process_webhook, RecipientOutcome, WebhookResponse, WebhookSettings};
pub use payload::{WebhookEvent, CONTRACT_SIGNED, SIGN_CONTRACT_EVENT};
pub use signature::{compute_signature, verify_signature, SIGNATURE_HEADER};
