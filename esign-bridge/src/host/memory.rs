//! In-memory host: documents, users, companies and notification log.
//!
//! Used by the service when no external host is wired in, and by tests.
//! All state sits behind one `RwLock`, so the conditional mark-signed update
//! is atomic with respect to concurrent webhook deliveries.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use super::{DocumentStore, NotificationLog, NotificationRecord, User, UserDirectory};
use crate::document::{SentRecord, SignUpdate, SignableDocument, SignedRecord};
use crate::error::{EsignError, Result};

/// Initial contents, typically loaded from a JSON file.
#[derive(Debug, Default, Deserialize)]
pub struct HostSeed {
    #[serde(default)]
    pub documents: Vec<SignableDocument>,
    #[serde(default)]
    pub users: Vec<User>,
    /// Company identifier → display name
    #[serde(default)]
    pub companies: HashMap<String, String>,
}

impl HostSeed {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse seed file {}", path.display()))
    }
}

#[derive(Default)]
struct State {
    documents: BTreeMap<String, SignableDocument>,
    users: Vec<User>,
    companies: HashMap<String, String>,
    notifications: Vec<NotificationRecord>,
}

/// Lock-protected host state.
#[derive(Default)]
pub struct InMemoryHost {
    state: RwLock<State>,
}

impl InMemoryHost {
    pub fn new(seed: HostSeed) -> Self {
        info!(
            documents = seed.documents.len(),
            users = seed.users.len(),
            companies = seed.companies.len(),
            "memory_host_seeded"
        );

        let documents = seed
            .documents
            .into_iter()
            .map(|doc| (doc.name.clone(), doc))
            .collect();

        Self {
            state: RwLock::new(State {
                documents,
                users: seed.users,
                companies: seed.companies,
                notifications: Vec::new(),
            }),
        }
    }

    pub async fn insert_document(&self, document: SignableDocument) {
        let mut state = self.state.write().await;
        state.documents.insert(document.name.clone(), document);
    }

    pub async fn document(&self, name: &str) -> Option<SignableDocument> {
        self.state.read().await.documents.get(name).cloned()
    }

    pub async fn notifications(&self) -> Vec<NotificationRecord> {
        self.state.read().await.notifications.clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryHost {
    async fn get(&self, name: &str) -> Result<Option<SignableDocument>> {
        Ok(self.document(name).await)
    }

    async fn find_by_contract_id(&self, contract_id: &str) -> Result<Option<SignableDocument>> {
        let state = self.state.read().await;
        let mut matches = state
            .documents
            .values()
            .filter(|doc| doc.contract_id.as_deref() == Some(contract_id));

        let first = matches.next().cloned();
        if matches.next().is_some() {
            return Err(EsignError::Host(format!(
                "contract ID {contract_id} is linked to more than one document"
            )));
        }
        Ok(first)
    }

    async fn mark_sent(&self, name: &str, record: SentRecord) -> Result<()> {
        let mut state = self.state.write().await;
        let doc = state
            .documents
            .get_mut(name)
            .ok_or_else(|| EsignError::NotFound(format!("document {name}")))?;

        doc.signature_sent = true;
        doc.contract_id = Some(record.contract_id);
        doc.signing_url = Some(record.signing_url);
        Ok(())
    }

    async fn mark_signed(&self, name: &str, record: SignedRecord) -> Result<SignUpdate> {
        let mut state = self.state.write().await;
        let doc = state
            .documents
            .get_mut(name)
            .ok_or_else(|| EsignError::NotFound(format!("document {name}")))?;

        if doc.signed {
            return Ok(SignUpdate::AlreadySigned);
        }

        doc.signed_pdf_url = Some(record.signed_pdf_url);
        doc.signature_date = Some(record.signature_date);
        doc.signed = true;
        Ok(SignUpdate::Applied)
    }

    async fn company_name(&self, company: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.companies.get(company).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryHost {
    async fn users_with_role(&self, role: &str) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| u.roles.iter().any(|r| r == role))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationLog for InMemoryHost {
    async fn create(&self, record: NotificationRecord) -> Result<()> {
        self.state.write().await.notifications.push(record);
        Ok(())
    }
}
