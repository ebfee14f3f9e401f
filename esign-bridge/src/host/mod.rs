//! Host application collaborators.
//!
//! The documents, users and notification log live in the host application.
//! This module defines the narrow interfaces the integration consumes and
//! bundles them into a [`Host`] that handlers receive explicitly.
//!
//! Implementations:
//! - [`memory::InMemoryHost`]: store, directory and notification log in one
//!   lock-protected structure (seedable from JSON)
//! - [`print::HttpPrintRenderer`]: fetches PDFs from the host's print service

pub mod memory;
pub mod print;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{SentRecord, SignUpdate, SignableDocument, SignedRecord};
use crate::error::{EsignError, Result};
use crate::mail::{Attachment, Mailer};

pub use memory::{HostSeed, InMemoryHost};
pub use print::HttpPrintRenderer;

/// A user account in the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub roles: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

/// Category of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Alert,
}

/// A persisted in-app notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub subject: String,
    pub email_content: String,
    pub for_user: String,
    pub kind: NotificationKind,
    pub document_type: String,
    pub document_name: String,
}

/// Access to signable documents and their company.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<SignableDocument>>;

    /// Find the document whose stored contract identifier equals `contract_id`.
    async fn find_by_contract_id(&self, contract_id: &str) -> Result<Option<SignableDocument>>;

    async fn mark_sent(&self, name: &str, record: SentRecord) -> Result<()>;

    /// Apply the signed field group unless the document is already signed.
    ///
    /// Implementations must make the check and the write a single step.
    async fn mark_signed(&self, name: &str, record: SignedRecord) -> Result<SignUpdate>;

    /// Display name of a company, if known.
    async fn company_name(&self, company: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users holding `role`, enabled or not.
    async fn users_with_role(&self, role: &str) -> Result<Vec<User>>;
}

#[async_trait]
pub trait NotificationLog: Send + Sync {
    async fn create(&self, record: NotificationRecord) -> Result<()>;
}

/// Renders a document to PDF for attaching to mail.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render_pdf(&self, document_type: &str, document: &SignableDocument)
        -> Result<Attachment>;
}

/// Bundle of host collaborators handed to the workflow and webhook handler.
#[derive(Clone)]
pub struct Host {
    pub documents: Arc<dyn DocumentStore>,
    pub users: Arc<dyn UserDirectory>,
    pub notifications: Arc<dyn NotificationLog>,
    pub mailer: Option<Arc<dyn Mailer>>,
    pub renderer: Option<Arc<dyn DocumentRenderer>>,
}

impl Host {
    /// Wire every collaborator except the mailer and renderer to one in-memory host.
    pub fn in_memory(
        memory: Arc<InMemoryHost>,
        mailer: Option<Arc<dyn Mailer>>,
        renderer: Option<Arc<dyn DocumentRenderer>>,
    ) -> Self {
        Self {
            documents: memory.clone(),
            users: memory.clone(),
            notifications: memory,
            mailer,
            renderer,
        }
    }

    pub fn mailer(&self) -> Result<&Arc<dyn Mailer>> {
        self.mailer.as_ref().ok_or_else(|| {
            EsignError::Configuration("Mail delivery not configured.".to_string())
        })
    }

    pub fn renderer(&self) -> Result<&Arc<dyn DocumentRenderer>> {
        self.renderer.as_ref().ok_or_else(|| {
            EsignError::Configuration("Document print service not configured.".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_defaults_to_enabled() {
        let user: User = serde_json::from_str(r#"{"id": "ops", "email": "ops@example.com"}"#).unwrap();
        assert!(user.enabled);
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_missing_collaborators_are_configuration_errors() {
        let host = Host::in_memory(Arc::new(InMemoryHost::new(HostSeed::default())), None, None);
        assert!(matches!(
            host.mailer(),
            Err(EsignError::Configuration(m)) if m == "Mail delivery not configured."
        ));
        assert!(matches!(host.renderer(), Err(EsignError::Configuration(_))));
    }

    #[test]
    fn test_notification_kind_serialization() {
        let json = serde_json::to_string(&NotificationKind::Alert).unwrap();
        assert_eq!(json, "\"Alert\"");
    }
}
