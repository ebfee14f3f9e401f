//! End-to-end webhook processing against the in-memory host.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;

use common::*;
use esign::host::Host;
use esign::mail::Mailer;
use esign::webhook::{compute_signature, process_webhook, WebhookResponse, WebhookSettings};
use esign::Secret;

fn settings(token: &Secret) -> WebhookSettings<'_> {
    WebhookSettings {
        token: Some(token),
        notify_role: "e-signature",
        document_label: "Quotation",
    }
}

async fn deliver(token: &Secret, host: &Host, body: &str) -> WebhookResponse {
    let signature = compute_signature(TOKEN, body.as_bytes()).unwrap();
    process_webhook(settings(token), host, body.as_bytes(), Some(&signature), today()).await
}

#[tokio::test]
async fn test_signed_event_updates_document_and_notifies() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());

    let response = deliver(&token, &host, &signed_event("c-1")).await;

    assert_eq!(response.status, Some("success"));
    assert_eq!(response.document.as_deref(), Some("QTN-0001"));
    assert_eq!(response.notifications.len(), 2);

    let doc = memory.document("QTN-0001").await.unwrap();
    assert!(doc.signed);
    assert_eq!(doc.signature_date, NaiveDate::from_ymd_opt(2024, 6, 1));
    assert_eq!(
        doc.signed_pdf_url.as_deref(),
        Some("https://files.esignatures.com/c-1.pdf")
    );

    // Untouched sibling
    assert!(!memory.document("QTN-0002").await.unwrap().signed);

    // Enabled role holders only
    let records = memory.notifications().await;
    let mut users: Vec<&str> = records.iter().map(|r| r.for_user.as_str()).collect();
    users.sort();
    assert_eq!(users, vec!["alice", "bob"]);
    assert!(records.iter().all(|r| r.subject == "Quotation QTN-0001 Signed"
        && r.email_content == "The Quotation <b>QTN-0001</b> has been signed."
        && r.document_name == "QTN-0001"
        && r.document_type == "Quotation"));

    let mut recipients: Vec<String> = mailer.sent().into_iter().flat_map(|e| e.to).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["alice@example.com", "bob@example.com"]);
}

#[tokio::test]
async fn test_redelivery_does_not_duplicate_notifications() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());
    let body = signed_event("c-1");

    let first = deliver(&token, &host, &body).await;
    let second = deliver(&token, &host, &body).await;

    assert_eq!(first.status, Some("success"));
    assert!(!first.already_signed);
    assert_eq!(second.status, Some("success"));
    assert!(second.already_signed);

    let records = memory.notifications().await;
    assert_eq!(records.iter().filter(|r| r.for_user == "alice").count(), 1);
    assert_eq!(records.len(), 2);
    assert_eq!(mailer.sent().len(), 2);
}

#[tokio::test]
async fn test_concurrent_redelivery_applies_once() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());
    let body = signed_event("c-2");

    let (a, b) = tokio::join!(deliver(&token, &host, &body), deliver(&token, &host, &body));

    assert_eq!(
        [a.already_signed, b.already_signed]
            .iter()
            .filter(|dup| **dup)
            .count(),
        1
    );
    assert_eq!(memory.notifications().await.len(), 2);
}

#[tokio::test]
async fn test_non_signed_event_is_ignored() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());

    let body = signed_event("c-1").replace("contract-signed", "contract-sent");
    let response = deliver(&token, &host, &body).await;

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({"status": "Ignored", "reason": "Not contract-signed event"})
    );
    assert!(!memory.document("QTN-0001").await.unwrap().signed);
    assert!(memory.notifications().await.is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_missing_contract_data_is_ignored() {
    let token = Secret::new(TOKEN).unwrap();
    let host = host_with(seeded_memory(), Arc::new(RecordingMailer::default()));

    for body in [
        r#"{"status": "contract-signed"}"#,
        r#"{"status": "contract-signed", "data": {}}"#,
        r#"{"status": "contract-signed", "data": {"contract": {}}}"#,
    ] {
        let response = deliver(&token, &host, body).await;
        assert_eq!(response.status, Some("Ignored"), "body {body}");
        assert_eq!(response.reason.as_deref(), Some("No contract data"));
    }
}

#[tokio::test]
async fn test_missing_pdf_url_is_rejected_without_writes() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let host = host_with(memory.clone(), Arc::new(RecordingMailer::default()));

    let body = r#"{"status": "contract-signed", "data": {"contract": {"id": "c-1"}}}"#;
    let response = deliver(&token, &host, body).await;

    assert_eq!(response.status, Some("error"));
    assert_eq!(response.reason.as_deref(), Some("Missing pdf_url or id"));
    assert!(!memory.document("QTN-0001").await.unwrap().signed);
}

#[tokio::test]
async fn test_unknown_contract_leaves_documents_untouched() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());

    let response = deliver(&token, &host, &signed_event("c-unknown")).await;

    assert_eq!(response.status, Some("error"));
    assert_eq!(
        response.reason.as_deref(),
        Some("No Quotation found for contract ID c-unknown")
    );
    for name in ["QTN-0001", "QTN-0002"] {
        let doc = memory.document(name).await.unwrap();
        assert!(!doc.signed);
        assert!(doc.signed_pdf_url.is_none());
        assert!(doc.signature_date.is_none());
    }
    assert!(memory.notifications().await.is_empty());
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_bad_signature_is_rejected() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let host = host_with(memory.clone(), Arc::new(RecordingMailer::default()));
    let body = signed_event("c-1");

    let forged = compute_signature("not-the-token", body.as_bytes()).unwrap();
    let response =
        process_webhook(settings(&token), &host, body.as_bytes(), Some(&forged), today()).await;
    assert_eq!(
        response.error.as_deref(),
        Some("Unauthorized: Invalid signature")
    );

    let response = process_webhook(settings(&token), &host, body.as_bytes(), None, today()).await;
    assert_eq!(response.error.as_deref(), Some("Missing signature"));

    assert!(!memory.document("QTN-0001").await.unwrap().signed);
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let memory = seeded_memory();
    let host = host_with(memory.clone(), Arc::new(RecordingMailer::default()));
    let body = signed_event("c-1");
    let signature = compute_signature(TOKEN, body.as_bytes()).unwrap();

    let settings = WebhookSettings {
        token: None,
        notify_role: "e-signature",
        document_label: "Quotation",
    };
    let response =
        process_webhook(settings, &host, body.as_bytes(), Some(&signature), today()).await;

    assert!(response.error.is_some());
    assert!(!memory.document("QTN-0001").await.unwrap().signed);
}

#[tokio::test]
async fn test_invalid_json_is_rejected() {
    let token = Secret::new(TOKEN).unwrap();
    let host = host_with(seeded_memory(), Arc::new(RecordingMailer::default()));

    let response = deliver(&token, &host, "{not json").await;

    assert_eq!(response.error.as_deref(), Some("Invalid JSON"));
    assert!(response.status.is_none());
}

#[tokio::test]
async fn test_signature_date_defaults_to_processing_date() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let host = host_with(memory.clone(), Arc::new(RecordingMailer::default()));

    let body = serde_json::json!({
        "status": "contract-signed",
        "data": {"contract": {
            "id": "c-2",
            "contract_pdf_url": "https://files.esignatures.com/c-2.pdf",
            "signers": [{"events": [{"event": "view_contract", "timestamp": "2024-06-01T09:00:00Z"}]}]
        }}
    })
    .to_string();

    deliver(&token, &host, &body).await;

    let doc = memory.document("QTN-0002").await.unwrap();
    assert_eq!(doc.signature_date, Some(today()));
}

#[tokio::test]
async fn test_failed_channels_do_not_block_other_recipients() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::failing_for(&["alice@example.com"]));
    let notifications = Arc::new(FlakyNotificationLog {
        inner: memory.clone(),
        fail_for: ["bob".to_string()].into_iter().collect(),
    });
    let host = Host {
        documents: memory.clone(),
        users: memory.clone(),
        notifications,
        mailer: Some(mailer.clone() as Arc<dyn Mailer>),
        renderer: None,
    };

    let response = deliver(&token, &host, &signed_event("c-1")).await;

    assert_eq!(response.status, Some("success"));

    let alice = response
        .notifications
        .iter()
        .find(|o| o.user == "alice")
        .unwrap();
    assert!(alice.notification_logged);
    assert!(!alice.email_sent);

    let bob = response
        .notifications
        .iter()
        .find(|o| o.user == "bob")
        .unwrap();
    assert!(!bob.notification_logged);
    assert!(bob.email_sent);

    let records = memory.notifications().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].for_user, "alice");
    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(mailer.sent()[0].to, vec!["bob@example.com".to_string()]);
}

#[tokio::test]
async fn test_null_signer_list_still_marks_signed() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());

    let body = r#"{"status": "contract-signed", "data": {"contract": {"id": "c-1", "contract_pdf_url": "https://x/c-1.pdf", "signers": null}}}"#;
    let response = deliver(&token, &host, body).await;

    assert_eq!(response.status, Some("success"));
    let doc = memory.document("QTN-0001").await.unwrap();
    assert!(doc.signed);
    assert_eq!(doc.signature_date, Some(today()));
    assert_eq!(mailer.sent().len(), 2);

    let body = r#"{"status": "contract-signed", "data": {"contract": {"id": "c-2", "contract_pdf_url": "https://x/c-2.pdf", "signers": [{"events": null}]}}}"#;
    let response = deliver(&token, &host, body).await;
    assert_eq!(response.status, Some("success"));
    assert!(memory.document("QTN-0002").await.unwrap().signed);
}

#[tokio::test]
async fn test_unexpected_types_are_not_parse_errors() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let host = host_with(memory.clone(), Arc::new(RecordingMailer::default()));

    let response = deliver(&token, &host, r#"{"status": 42}"#).await;
    assert_eq!(response.status, Some("Ignored"));
    assert_eq!(response.reason.as_deref(), Some("Not contract-signed event"));

    let response = deliver(&token, &host, "[1, 2, 3]").await;
    assert_eq!(response.status, Some("Ignored"));

    memory
        .insert_document(sent_document("QTN-0042", "12345"))
        .await;

    let body = r#"{"status": "contract-signed", "data": {"contract": {"id": 12345, "contract_pdf_url": "https://x/12345.pdf"}}}"#;
    let response = deliver(&token, &host, body).await;
    assert_eq!(response.status, Some("success"));
    assert_eq!(response.document.as_deref(), Some("QTN-0042"));
    assert!(memory.document("QTN-0042").await.unwrap().signed);
}

#[tokio::test]
async fn test_without_mailer_recipients_report_email_not_sent() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    let host = Host::in_memory(memory.clone(), None, None);

    let response = deliver(&token, &host, &signed_event("c-1")).await;

    assert_eq!(response.status, Some("success"));
    assert_eq!(response.notifications.len(), 2);
    assert!(response
        .notifications
        .iter()
        .all(|o| o.notification_logged && !o.email_sent));
    assert_eq!(memory.notifications().await.len(), 2);
}

#[tokio::test]
async fn test_notification_body_escapes_document_name() {
    let token = Secret::new(TOKEN).unwrap();
    let memory = seeded_memory();
    memory
        .insert_document(sent_document("QTN<7>&Co", "c-esc"))
        .await;
    let mailer = Arc::new(RecordingMailer::default());
    let host = host_with(memory.clone(), mailer.clone());

    deliver(&token, &host, &signed_event("c-esc")).await;

    let records = memory.notifications().await;
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].email_content,
        "The Quotation <b>QTN&lt;7&gt;&amp;Co</b> has been signed."
    );
    assert!(mailer
        .sent()
        .iter()
        .all(|e| e.html == records[0].email_content));
}
