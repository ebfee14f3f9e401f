//! PDF rendering through the host's print service.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use super::DocumentRenderer;
use crate::document::SignableDocument;
use crate::error::{EsignError, Result};
use crate::mail::Attachment;

/// Fetches `GET {print_url}?doctype=..&name=..` and returns the PDF bytes.
#[derive(Clone, Debug)]
pub struct HttpPrintRenderer {
    http: Client,
    print_url: String,
}

impl HttpPrintRenderer {
    pub fn new(http: Client, print_url: impl Into<String>) -> Self {
        Self {
            http,
            print_url: print_url.into(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for HttpPrintRenderer {
    async fn render_pdf(
        &self,
        document_type: &str,
        document: &SignableDocument,
    ) -> Result<Attachment> {
        let response = self
            .http
            .get(&self.print_url)
            .query(&[("doctype", document_type), ("name", document.name.as_str())])
            .send()
            .await
            .map_err(|e| EsignError::Host(format!("print service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                document = %document.name,
                status_code = status.as_u16(),
                "print_render_failed"
            );
            return Err(EsignError::Host(format!(
                "print service returned {} for {}",
                status.as_u16(),
                document.name
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EsignError::Host(format!("print service body: {e}")))?;

        info!(
            document = %document.name,
            pdf_length = bytes.len(),
            "print_render_complete"
        );

        Ok(Attachment::pdf(format!("{}.pdf", document.name), bytes.to_vec()))
    }
}
