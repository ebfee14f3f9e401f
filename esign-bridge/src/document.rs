//! Signable document records as read from and written back to the host.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A business record (typically a quotation) that can be sent for signature.
///
/// Named attributes cover everything this crate reads or writes. Any other
/// host field is kept in `extra` so placeholder mappings can reference it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignableDocument {
    /// Document identifier (e.g. "SAL-QTN-2024-00012")
    pub name: String,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    /// Company identifier, resolved to a display name for outbound mail
    #[serde(default)]
    pub company: Option<String>,
    /// Selected remote template
    #[serde(default)]
    pub template_id: Option<String>,

    // Written at send-time
    #[serde(default)]
    pub signature_sent: bool,
    #[serde(default)]
    pub contract_id: Option<String>,
    #[serde(default)]
    pub signing_url: Option<String>,

    // Written by the webhook
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub signed_pdf_url: Option<String>,
    #[serde(default)]
    pub signature_date: Option<NaiveDate>,

    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

impl SignableDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Resolve a field by name and coerce it to text.
    ///
    /// Returns `None` for absent and falsy values: null, `false`, zero, and
    /// empty strings, arrays or objects.
    pub fn field_text(&self, field: &str) -> Option<String> {
        let text = match field {
            "name" => Some(self.name.clone()),
            "customer_name" => self.customer_name.clone(),
            "contact_email" => self.contact_email.clone(),
            "company" => self.company.clone(),
            "template_id" => self.template_id.clone(),
            "contract_id" => self.contract_id.clone(),
            "signing_url" => self.signing_url.clone(),
            "signed_pdf_url" => self.signed_pdf_url.clone(),
            "signature_date" => self.signature_date.map(|d| d.to_string()),
            _ => self.extra.get(field).and_then(value_text),
        };

        text.filter(|s| !s.is_empty())
    }
}

/// Coerce a JSON value to its textual form. Falsy values have none.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(fields) if fields.is_empty() => None,
        other => Some(other.to_string()),
    }
}

/// Fields persisted once the signature request has gone out.
#[derive(Debug, Clone, PartialEq)]
pub struct SentRecord {
    pub contract_id: String,
    pub signing_url: String,
}

/// Fields persisted once the provider reports the contract as signed.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRecord {
    pub signed_pdf_url: String,
    pub signature_date: NaiveDate,
}

/// Result of a conditional mark-signed update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpdate {
    Applied,
    AlreadySigned,
}
