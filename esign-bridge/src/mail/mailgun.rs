//! Mailgun messages API sender.
//!
//! Reference: https://documentation.mailgun.com/docs/mailgun/api-reference/openapi-final/tag/Messages/

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{error, info};

use super::{Mailer, OutboundEmail};
use crate::credentials::Secret;
use crate::error::{EsignError, Result};

/// Sends mail through `POST /v3/{domain}/messages`.
#[derive(Clone, Debug)]
pub struct MailgunMailer {
    http: Client,
    api_url: String,
    domain: String,
    api_key: Secret,
    from: String,
}

impl MailgunMailer {
    pub fn new(
        http: Client,
        api_url: impl Into<String>,
        domain: impl Into<String>,
        api_key: Secret,
        from: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            domain: domain.into(),
            api_key,
            from: from.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.api_url.trim_end_matches('/'),
            self.domain
        )
    }

    fn build_form(&self, email: OutboundEmail) -> Result<Form> {
        let mut form = Form::new()
            .text("from", self.from.clone())
            .text("subject", email.subject)
            .text("html", email.html);

        for recipient in email.to {
            form = form.text("to", recipient);
        }

        for attachment in email.attachments {
            let part = Part::bytes(attachment.data)
                .file_name(attachment.file_name)
                .mime_str(&attachment.content_type)
                .map_err(|e| EsignError::Delivery(format!("invalid attachment type: {e}")))?;
            form = form.part("attachment", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let recipients = email.to.len();
        let subject = email.subject.clone();
        let form = self.build_form(email)?;

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth("api", Some(self.api_key.expose()))
            .multipart(form)
            .send()
            .await
            .map_err(|e| EsignError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                status_code = status.as_u16(),
                body = %body,
                "mailgun_send_failed"
            );
            return Err(EsignError::Delivery(format!(
                "Mailgun returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        info!(
            domain = %self.domain,
            recipients = recipients,
            subject = %subject,
            "mailgun_sent"
        );

        Ok(())
    }
}
