//! Send-for-signature workflow.
//!
//! ```text
//! token → document → signer → template → placeholders → create contract
//!       → render PDF → email signing link → persist sent fields
//! ```
//!
//! Errors propagate to the caller; nothing here is swallowed.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::{EsignClient, SignerIdentity};
use crate::config::Config;
use crate::document::{SentRecord, SignableDocument};
use crate::error::{EsignError, Result};
use crate::host::Host;
use crate::mail::{escape_html, Attachment, OutboundEmail};
use crate::mapping::build_placeholder_fields;

/// Caller input for a signature request.
///
/// Signer fields are fallbacks; the document's own contact wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub signer_name: Option<String>,
    #[serde(default)]
    pub signer_email: Option<String>,
    /// Send again even though a contract already exists for the document
    #[serde(default)]
    pub resend: bool,
}

/// Confirmation returned once the signing link has been emailed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendConfirmation {
    pub status: String,
    pub signing_url: String,
}

/// Create a contract for `document_name` and email the signing link.
pub async fn send_for_signature(
    config: &Config,
    client: &EsignClient,
    host: &Host,
    document_name: &str,
    request: SendRequest,
) -> Result<SendConfirmation> {
    let token = config.api_token()?;
    let renderer = host.renderer()?;
    let mailer = host.mailer()?;

    let document = host
        .documents
        .get(document_name)
        .await?
        .ok_or_else(|| {
            EsignError::NotFound(format!("{} {}", config.document_label, document_name))
        })?;

    ensure_sendable(&document, request.resend)?;

    let signer = resolve_signer(&document, &request)?;

    let template_id = document
        .template_id
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| EsignError::Validation("No e-signature template selected.".to_string()))?;

    let placeholder_fields = build_placeholder_fields(&document, &config.placeholder_mappings);

    info!(
        document = %document.name,
        template_id = %template_id,
        placeholder_count = placeholder_fields.len(),
        resend = request.resend,
        "signature_request_start"
    );

    let contract = client
        .create_contract(token, template_id, &signer, placeholder_fields)
        .await?;

    let pdf = renderer
        .render_pdf(&config.document_label, &document)
        .await?;

    let company_name = match document.company.as_deref() {
        Some(company) => host
            .documents
            .company_name(company)
            .await?
            .or_else(|| Some(company.to_string())),
        None => None,
    };

    let email = signature_request_email(
        &config.document_label,
        &document.name,
        &signer,
        &contract.signing_url,
        company_name.as_deref(),
        pdf,
    );
    mailer.send(email).await?;

    host.documents
        .mark_sent(
            &document.name,
            SentRecord {
                contract_id: contract.contract_id.clone(),
                signing_url: contract.signing_url.clone(),
            },
        )
        .await?;

    info!(
        document = %document.name,
        contract_id = %contract.contract_id,
        "signature_request_sent"
    );

    Ok(SendConfirmation {
        status: format!(
            "Email sent with {} and signing link.",
            config.document_label.to_lowercase()
        ),
        signing_url: contract.signing_url,
    })
}

/// Refuse documents that are signed, or already sent unless resending.
fn ensure_sendable(document: &SignableDocument, resend: bool) -> Result<()> {
    if document.signed {
        return Err(EsignError::Validation(format!(
            "{} is already signed.",
            document.name
        )));
    }

    if document.signature_sent && document.contract_id.is_some() {
        if !resend {
            return Err(EsignError::Validation(format!(
                "Signature request for {} was already sent; set resend to send it again.",
                document.name
            )));
        }
        warn!(
            document = %document.name,
            previous_contract_id = ?document.contract_id,
            "signature_request_resend"
        );
    }

    Ok(())
}

/// Document contact first, then caller-supplied fallback.
fn resolve_signer(document: &SignableDocument, request: &SendRequest) -> Result<SignerIdentity> {
    let pick = |primary: &Option<String>, fallback: &Option<String>| {
        primary
            .iter()
            .chain(fallback.iter())
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    };

    let email = pick(&document.contact_email, &request.signer_email)
        .ok_or_else(|| EsignError::Validation("No signer email available.".to_string()))?;

    let name = pick(&document.customer_name, &request.signer_name).unwrap_or_else(|| email.clone());

    Ok(SignerIdentity { name, email })
}

/// Compose the signing-request email to the counterpart.
pub fn signature_request_email(
    document_label: &str,
    document_name: &str,
    signer: &SignerIdentity,
    signing_url: &str,
    company_name: Option<&str>,
    attachment: Attachment,
) -> OutboundEmail {
    let url = escape_html(signing_url);
    let html = format!(
        "Dear {name},<br><br>\
         Please find your {label} attached.<br><br>\
         To review and sign it, click the link below:<br>\
         <a href=\"{url}\">{url}</a><br><br>\
         Best regards,<br>\
         {company}",
        name = escape_html(&signer.name),
        label = escape_html(&document_label.to_lowercase()),
        url = url,
        company = escape_html(company_name.unwrap_or_default()),
    );

    OutboundEmail {
        to: vec![signer.email.clone()],
        subject: format!("{document_label} {document_name} – Signature Request"),
        html,
        attachments: vec![attachment],
    }
}
