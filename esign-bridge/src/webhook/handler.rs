//! Signed-contract webhook processing.
//!
//! [`process_webhook`] is transport-agnostic: it takes the raw body, the
//! signature header value, the host collaborators and today's date, and always
//! returns a [`WebhookResponse`]. Nothing here returns an error to the caller.
//!
//! ```text
//! verify HMAC → parse → contract-signed? → contract data → resolve document
//!   → derive signature date → mark signed (once) → notify role members
//! ```

use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use tracing::{error, info, warn};

use super::payload::WebhookEvent;
use super::signature::verify_signature;
use crate::credentials::Secret;
use crate::document::{SignUpdate, SignedRecord};
use crate::error::EsignError;
use crate::host::{Host, NotificationKind, NotificationRecord, User};
use crate::mail::{escape_html, OutboundEmail};

/// Settings the handler needs besides the collaborators.
#[derive(Debug, Clone, Copy)]
pub struct WebhookSettings<'a> {
    /// HMAC key; `None` when the token is not configured
    pub token: Option<&'a Secret>,
    /// Role whose enabled members are notified
    pub notify_role: &'a str,
    /// Document type label ("Quotation")
    pub document_label: &'a str,
}

/// Webhook response body. Always returned with HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_signed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notifications: Vec<RecipientOutcome>,
}

impl WebhookResponse {
    fn base() -> Self {
        Self {
            status: None,
            error: None,
            reason: None,
            document: None,
            already_signed: false,
            notifications: Vec::new(),
        }
    }

    /// Request refused before any processing (auth, parse).
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base()
        }
    }

    /// Valid request that is not acted upon.
    pub fn ignored(reason: impl Into<String>) -> Self {
        Self {
            status: Some("Ignored"),
            reason: Some(reason.into()),
            ..Self::base()
        }
    }

    /// Valid request that could not be applied.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: Some("error"),
            reason: Some(reason.into()),
            ..Self::base()
        }
    }

    pub fn success(document: impl Into<String>, notifications: Vec<RecipientOutcome>) -> Self {
        Self {
            status: Some("success"),
            document: Some(document.into()),
            notifications,
            ..Self::base()
        }
    }

    /// Redelivery of an event that was already applied.
    pub fn already_signed(document: impl Into<String>) -> Self {
        Self {
            status: Some("success"),
            document: Some(document.into()),
            already_signed: true,
            ..Self::base()
        }
    }
}

/// Per-recipient delivery result; both channels are attempted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub user: String,
    pub notification_logged: bool,
    pub email_sent: bool,
}

/// Process one webhook delivery.
pub async fn process_webhook(
    settings: WebhookSettings<'_>,
    host: &Host,
    raw_body: &[u8],
    signature: Option<&str>,
    today: NaiveDate,
) -> WebhookResponse {
    // Authenticate
    let Some(token) = settings.token else {
        error!(target: "esign::audit", "webhook_token_not_configured");
        return WebhookResponse::rejected("E-signature API token not configured.");
    };

    if let Err(e) = verify_signature(token.expose(), raw_body, signature) {
        warn!(
            target: "esign::audit",
            reason = %e,
            body_length = raw_body.len(),
            "webhook_rejected"
        );
        let message = match e {
            EsignError::Security(message) => message,
            other => other.to_string(),
        };
        return WebhookResponse::rejected(message);
    }

    // Parse
    let event = match WebhookEvent::from_slice(raw_body) {
        Ok(event) => event,
        Err(e) => {
            error!(
                error = %e,
                line = e.line(),
                column = e.column(),
                category = ?e.classify(),
                body_length = raw_body.len(),
                "webhook_json_parse_failed"
            );
            return WebhookResponse::rejected("Invalid JSON");
        }
    };

    if !event.is_contract_signed() {
        info!(status = ?event.status, "webhook_event_ignored");
        return WebhookResponse::ignored("Not contract-signed event");
    }

    let Some(contract) = event.contract() else {
        info!("webhook_contract_missing");
        return WebhookResponse::ignored("No contract data");
    };

    let Some((contract_id, pdf_url)) = contract.id_and_pdf_url() else {
        warn!(
            has_id = contract.id.is_some(),
            has_pdf_url = contract.contract_pdf_url.is_some(),
            "webhook_contract_incomplete"
        );
        return WebhookResponse::failed("Missing pdf_url or id");
    };

    info!(contract_id = %contract_id, "webhook_contract_signed");

    // Resolve
    let document = match host.documents.find_by_contract_id(contract_id).await {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            warn!(contract_id = %contract_id, "webhook_document_not_found");
            return WebhookResponse::failed(format!(
                "No {} found for contract ID {}",
                settings.document_label, contract_id
            ));
        }
        Err(e) => {
            error!(contract_id = %contract_id, error = %e, "webhook_document_lookup_failed");
            return WebhookResponse::failed(format!(
                "Could not resolve contract ID {contract_id}"
            ));
        }
    };

    // Apply
    let record = SignedRecord {
        signed_pdf_url: pdf_url.to_string(),
        signature_date: contract.signature_date(today),
    };
    let signature_date = record.signature_date;

    let update = host.documents.mark_signed(&document.name, record).await;
    match update {
        Ok(SignUpdate::Applied) => {
            info!(
                document = %document.name,
                contract_id = %contract_id,
                signature_date = %signature_date,
                "webhook_document_signed"
            );
        }
        Ok(SignUpdate::AlreadySigned) => {
            info!(
                document = %document.name,
                contract_id = %contract_id,
                "webhook_duplicate_delivery"
            );
            return WebhookResponse::already_signed(document.name);
        }
        Err(e) => {
            error!(document = %document.name, error = %e, "webhook_document_update_failed");
            return WebhookResponse::failed(format!("Could not update {}", document.name));
        }
    }

    // Notify
    let outcomes = notify_signed(settings, host, &document.name).await;

    WebhookResponse::success(document.name, outcomes)
}

/// Notify every enabled holder of the role, one record and one email each.
async fn notify_signed(
    settings: WebhookSettings<'_>,
    host: &Host,
    document_name: &str,
) -> Vec<RecipientOutcome> {
    let users = match host.users.users_with_role(settings.notify_role).await {
        Ok(users) => users,
        Err(e) => {
            error!(role = %settings.notify_role, error = %e, "webhook_recipients_lookup_failed");
            return Vec::new();
        }
    };

    let recipients: Vec<User> = users.into_iter().filter(|u| u.enabled).collect();

    let subject = format!("{} {} Signed", settings.document_label, document_name);
    let message = format!(
        "The {} <b>{}</b> has been signed.",
        escape_html(settings.document_label),
        escape_html(document_name)
    );

    let deliveries = recipients.iter().map(|user| {
        notify_recipient(settings, host, user, document_name, &subject, &message)
    });
    let outcomes = join_all(deliveries).await;

    let failures = outcomes
        .iter()
        .filter(|o| !o.notification_logged || !o.email_sent)
        .count();

    info!(
        document = %document_name,
        recipients = outcomes.len(),
        failures = failures,
        "webhook_notifications_complete"
    );

    outcomes
}

async fn notify_recipient(
    settings: WebhookSettings<'_>,
    host: &Host,
    user: &User,
    document_name: &str,
    subject: &str,
    message: &str,
) -> RecipientOutcome {
    let record = NotificationRecord {
        subject: subject.to_string(),
        email_content: message.to_string(),
        for_user: user.id.clone(),
        kind: NotificationKind::Alert,
        document_type: settings.document_label.to_string(),
        document_name: document_name.to_string(),
    };

    let notification_logged = match host.notifications.create(record).await {
        Ok(()) => true,
        Err(e) => {
            warn!(user = %user.id, error = %e, "webhook_notification_log_failed");
            false
        }
    };

    let email = OutboundEmail {
        to: vec![user.email.clone()],
        subject: subject.to_string(),
        html: message.to_string(),
        attachments: Vec::new(),
    };

    let email_sent = match host.mailer() {
        Ok(mailer) => match mailer.send(email).await {
            Ok(()) => true,
            Err(e) => {
                warn!(user = %user.id, error = %e, "webhook_notification_email_failed");
                false
            }
        },
        Err(_) => {
            warn!(user = %user.id, "webhook_notification_email_not_configured");
            false
        }
    };

    RecipientOutcome {
        user: user.id.clone(),
        notification_logged,
        email_sent,
    }
}
