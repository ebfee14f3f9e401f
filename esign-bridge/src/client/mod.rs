//! eSignatures.com API client.
//!
//! Two calls are used: listing templates and creating a contract. The token
//! travels as a query parameter, so request URLs are never logged.

pub mod types;

use std::time::Duration;

use reqwest::Client;
use tracing::{error, info, warn};
use url::Url;

use crate::credentials::Secret;
use crate::error::{EsignError, Result};
use crate::mapping::PlaceholderField;

pub use types::{
    ContractEnvelope, ContractRequest, ContractSigner, CreatedContract, SignerIdentity,
    TemplateList, TemplateOption,
};

/// Client for the provider's REST API.
#[derive(Clone, Debug)]
pub struct EsignClient {
    http: Client,
    base_url: Url,
}

impl EsignClient {
    /// Create a client for `base_url`. Without a timeout the reqwest default applies.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Self::with_http_client(http, base_url)
    }

    /// Create a client sharing an existing reqwest `Client`.
    pub fn with_http_client(http: Client, base_url: &str) -> Result<Self> {
        // Url::join drops the last path segment unless it ends with '/'
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|e| {
            EsignError::Configuration(format!("invalid e-signature API URL {base_url:?}: {e}"))
        })?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| EsignError::Configuration(format!("invalid endpoint {path}: {e}")))
    }

    /// List available templates.
    ///
    /// Any failure (transport, non-success status, undecodable body) yields an
    /// empty list: an empty result means "no templates available".
    pub async fn list_templates(&self, token: &Secret) -> Vec<TemplateOption> {
        let url = match self.endpoint("api/templates") {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "esign_templates_endpoint_invalid");
                return Vec::new();
            }
        };

        let response = match self
            .http
            .get(url)
            .query(&[("token", token.expose())])
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e.without_url(), "esign_templates_request_failed");
                return Vec::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status_code = status.as_u16(), "esign_templates_non_success");
            return Vec::new();
        }

        match response.json::<TemplateList>().await {
            Ok(list) => {
                let templates: Vec<TemplateOption> =
                    list.data.into_iter().map(TemplateOption::from).collect();
                info!(count = templates.len(), "esign_templates_listed");
                templates
            }
            Err(e) => {
                warn!(error = %e.without_url(), "esign_templates_decode_failed");
                Vec::new()
            }
        }
    }

    /// Create a contract for a single signer from `template_id`.
    pub async fn create_contract(
        &self,
        token: &Secret,
        template_id: &str,
        signer: &SignerIdentity,
        placeholder_fields: Vec<PlaceholderField>,
    ) -> Result<CreatedContract> {
        let template_id = template_id.trim();
        if template_id.is_empty() {
            return Err(EsignError::Validation(
                "No e-signature template selected.".to_string(),
            ));
        }

        let request = ContractRequest {
            template_id: template_id.to_string(),
            signers: vec![ContractSigner {
                name: signer.name.clone(),
                email: signer.email.clone(),
                signature_request_delivery_methods: Vec::new(),
            }],
            placeholder_fields,
        };

        info!(
            template_id = %request.template_id,
            placeholder_count = request.placeholder_fields.len(),
            "esign_contract_create_start"
        );

        let response = self
            .http
            .post(self.endpoint("api/contracts")?)
            .query(&[("token", token.expose())])
            .json(&request)
            .send()
            .await
            .map_err(|e| EsignError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EsignError::Transport(e.without_url()))?;

        if !status.is_success() {
            error!(
                status_code = status.as_u16(),
                body_length = body.len(),
                "esign_contract_create_failed"
            );
            return Err(EsignError::Integration {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ContractEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(error = %e, "esign_contract_response_invalid");
                return Err(EsignError::Integration {
                    status: status.as_u16(),
                    body,
                });
            }
        };

        let contract = envelope.data.contract;
        let Some(signer) = contract.signers.into_iter().next() else {
            error!(contract_id = %contract.id, "esign_contract_without_signer");
            return Err(EsignError::Integration {
                status: status.as_u16(),
                body,
            });
        };

        info!(contract_id = %contract.id, "esign_contract_created");

        Ok(CreatedContract {
            contract_id: contract.id,
            signing_url: signer.sign_page_url,
        })
    }
}
