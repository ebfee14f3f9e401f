//! Inbound webhook payload types.
//!
//! Everything is optional and leniently typed: the body is untrusted, and a
//! well-formed body with unexpected shapes must still reach the handler's
//! decisions instead of failing as a parse error. `null` lists are empty,
//! numbers used as text are stringified, anything else unexpected is absent.

use chrono::NaiveDate;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Event discriminator for a completed contract.
pub const CONTRACT_SIGNED: &str = "contract-signed";

/// Signer event carrying the signature timestamp.
pub const SIGN_CONTRACT_EVENT: &str = "sign_contract";

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEvent {
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub data: Option<EventData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventData {
    #[serde(default, deserialize_with = "lenient_object")]
    pub contract: Option<ContractPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContractPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub contract_pdf_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub signers: Vec<SignerPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignerPayload {
    #[serde(default, deserialize_with = "lenient_list")]
    pub events: Vec<SignerEvent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignerEvent {
    #[serde(default, deserialize_with = "lenient_text")]
    pub event: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub timestamp: Option<String>,
}

/// Strings as-is, numbers in their textual form, anything else absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Objects decode into `T`; any other value is absent.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// Arrays keep their object elements; `null` or any other value is empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl WebhookEvent {
    /// Parse a raw body. Only malformed JSON is an error; a well-formed body
    /// that is not an object yields an event with no status.
    pub fn from_slice(raw: &[u8]) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_slice(raw)?;
        Ok(match value {
            Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => Self::default(),
        })
    }

    pub fn is_contract_signed(&self) -> bool {
        self.status.as_deref() == Some(CONTRACT_SIGNED)
    }

    /// The contract object, unless absent or carrying nothing we recognise.
    pub fn contract(&self) -> Option<&ContractPayload> {
        self.data
            .as_ref()
            .and_then(|d| d.contract.as_ref())
            .filter(|c| !c.is_empty())
    }
}

impl ContractPayload {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.contract_pdf_url.is_none() && self.signers.is_empty()
    }

    /// Non-empty contract id and signed PDF url, if both are present.
    pub fn id_and_pdf_url(&self) -> Option<(&str, &str)> {
        let id = self.id.as_deref().filter(|s| !s.is_empty())?;
        let url = self.contract_pdf_url.as_deref().filter(|s| !s.is_empty())?;
        Some((id, url))
    }

    /// Signature date from the first `sign_contract` event, in payload order.
    ///
    /// The timestamp's first ten characters must be a `YYYY-MM-DD` date;
    /// otherwise `fallback` is returned.
    pub fn signature_date(&self, fallback: NaiveDate) -> NaiveDate {
        let first = self
            .signers
            .iter()
            .flat_map(|s| s.events.iter())
            .find(|e| e.event.as_deref() == Some(SIGN_CONTRACT_EVENT));

        let Some(event) = first else {
            return fallback;
        };

        let timestamp = event.timestamp.as_deref().unwrap_or_default();
        match timestamp
            .get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        {
            Some(date) => date,
            None => {
                warn!(
                    timestamp = %timestamp,
                    fallback = %fallback,
                    "webhook_sign_timestamp_invalid"
                );
                fallback
            }
        }
    }
}
