//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use esign::document::SignableDocument;
use esign::error::{EsignError, Result};
use esign::host::{HostSeed, NotificationLog, NotificationRecord, User};
use esign::mail::{Mailer, OutboundEmail};
use esign::{Host, InMemoryHost};

pub const TOKEN: &str = "test-api-token";

/// Mailer that records every email and fails for selected recipients.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
    pub fail_for: HashSet<String>,
}

impl RecordingMailer {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: addresses.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        if email.to.iter().any(|to| self.fail_for.contains(to)) {
            return Err(EsignError::Delivery(format!("refused {:?}", email.to)));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Notification log that refuses records for selected users.
pub struct FlakyNotificationLog {
    pub inner: Arc<InMemoryHost>,
    pub fail_for: HashSet<String>,
}

#[async_trait]
impl NotificationLog for FlakyNotificationLog {
    async fn create(&self, record: NotificationRecord) -> Result<()> {
        if self.fail_for.contains(&record.for_user) {
            return Err(EsignError::Host("notification log unavailable".to_string()));
        }
        self.inner.create(record).await
    }
}

pub fn user(id: &str, enabled: bool, roles: &[&str]) -> User {
    User {
        id: id.to_string(),
        email: format!("{id}@example.com"),
        enabled,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

pub fn sent_document(name: &str, contract_id: &str) -> SignableDocument {
    let mut doc = SignableDocument::new(name);
    doc.customer_name = Some("Acme Ltd".to_string());
    doc.contact_email = Some("buyer@acme.test".to_string());
    doc.template_id = Some("tpl-1".to_string());
    doc.signature_sent = true;
    doc.contract_id = Some(contract_id.to_string());
    doc.signing_url = Some(format!("https://esignatures.com/sign/{contract_id}"));
    doc
}

/// Memory host with two sent quotations and a mix of users.
pub fn seeded_memory() -> Arc<InMemoryHost> {
    Arc::new(InMemoryHost::new(HostSeed {
        documents: vec![
            sent_document("QTN-0001", "c-1"),
            sent_document("QTN-0002", "c-2"),
        ],
        users: vec![
            user("alice", true, &["e-signature"]),
            user("bob", true, &["e-signature", "sales"]),
            user("carol", false, &["e-signature"]),
            user("dave", true, &["sales"]),
        ],
        companies: [("ACME".to_string(), "Acme Corporation".to_string())]
            .into_iter()
            .collect(),
    }))
}

pub fn host_with(memory: Arc<InMemoryHost>, mailer: Arc<RecordingMailer>) -> Host {
    Host::in_memory(memory, Some(mailer as Arc<dyn Mailer>), None)
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

pub fn signed_event(contract_id: &str) -> String {
    serde_json::json!({
        "status": "contract-signed",
        "data": {
            "contract": {
                "id": contract_id,
                "contract_pdf_url": format!("https://files.esignatures.com/{contract_id}.pdf"),
                "signers": [
                    {
                        "events": [
                            {"event": "email_contract_sent", "timestamp": "2024-05-30T08:00:00Z"},
                            {"event": "sign_contract", "timestamp": "2024-06-01T10:00:00Z"}
                        ]
                    }
                ]
            }
        }
    })
    .to_string()
}
