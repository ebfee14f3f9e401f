//! Wire types for the eSignatures.com REST API.

use serde::{Deserialize, Serialize};

use crate::mapping::PlaceholderField;

// =============================================================================
// Templates
// =============================================================================

/// `GET /api/templates` response body.
#[derive(Debug, Deserialize)]
pub struct TemplateList {
    #[serde(default)]
    pub data: Vec<RemoteTemplate>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteTemplate {
    pub title: String,
    pub template_id: String,
}

/// A template as offered to users when picking one for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOption {
    pub label: String,
    pub id: String,
}

impl From<RemoteTemplate> for TemplateOption {
    fn from(t: RemoteTemplate) -> Self {
        Self {
            label: t.title,
            id: t.template_id,
        }
    }
}

// =============================================================================
// Contracts
// =============================================================================

/// The person asked to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerIdentity {
    pub name: String,
    pub email: String,
}

/// `POST /api/contracts` request body.
#[derive(Debug, Serialize)]
pub struct ContractRequest {
    pub template_id: String,
    pub signers: Vec<ContractSigner>,
    pub placeholder_fields: Vec<PlaceholderField>,
}

#[derive(Debug, Serialize)]
pub struct ContractSigner {
    pub name: String,
    pub email: String,
    /// Left empty: the signing link is delivered by our own email.
    pub signature_request_delivery_methods: Vec<String>,
}

/// `POST /api/contracts` response body.
#[derive(Debug, Deserialize)]
pub struct ContractEnvelope {
    pub data: ContractData,
}

#[derive(Debug, Deserialize)]
pub struct ContractData {
    pub contract: RemoteContract,
}

#[derive(Debug, Deserialize)]
pub struct RemoteContract {
    pub id: String,
    #[serde(default)]
    pub signers: Vec<RemoteSigner>,
}

#[derive(Debug, Deserialize)]
pub struct RemoteSigner {
    pub sign_page_url: String,
}

/// What the caller needs from a freshly created contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContract {
    pub contract_id: String,
    pub signing_url: String,
}
