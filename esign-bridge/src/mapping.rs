//! Placeholder mapping from document fields to remote template slots.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::SignableDocument;

/// One configured (document field → template placeholder) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source_field: String,
    pub api_key: String,
}

impl FieldMapping {
    pub fn new(source_field: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            source_field: source_field.into(),
            api_key: api_key.into(),
        }
    }
}

/// A filled placeholder as the contracts API expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderField {
    pub api_key: String,
    pub value: String,
}

/// Build placeholder fields for a document.
///
/// Rows whose source field is absent or empty are skipped. Output order
/// follows `mappings`; duplicate keys are passed through as-is.
pub fn build_placeholder_fields(
    document: &SignableDocument,
    mappings: &[FieldMapping],
) -> Vec<PlaceholderField> {
    let fields: Vec<PlaceholderField> = mappings
        .iter()
        .filter_map(|row| {
            let value = document.field_text(&row.source_field)?;
            Some(PlaceholderField {
                api_key: row.api_key.clone(),
                value,
            })
        })
        .collect();

    debug!(
        document = %document.name,
        mappings = mappings.len(),
        placeholders = fields.len(),
        "placeholder_fields_built"
    );

    fields
}

/// Parse mapping rows from `field=placeholder` entries.
///
/// Malformed entries are skipped with a warning.
pub fn parse_mappings<I, S>(entries: I) -> Vec<FieldMapping>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((field, key)) if !field.trim().is_empty() && !key.trim().is_empty() => {
                    Some(FieldMapping::new(field.trim(), key.trim()))
                }
                _ => {
                    warn!(entry = %entry, "placeholder_mapping_invalid");
                    None
                }
            }
        })
        .collect()
}
