//! esign-bridge web server.
//!
//! This binary:
//! - Lists provider templates for the document form
//! - Sends documents for signature (contract + signing email)
//! - Receives signed-contract webhooks and notifies the e-signature role

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use esign::host::{DocumentRenderer, HostSeed, HttpPrintRenderer};
use esign::mail::{MailgunMailer, Mailer};
use esign::web::router;
use esign::{AppState, Config, EsignClient, Host, InMemoryHost};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        esign_api_url = %config.esign_api_url,
        esign_token_configured = config.esign_api_token.is_some(),
        placeholder_mappings = config.placeholder_mappings.len(),
        notify_role = %config.notify_role,
        print_service_configured = config.print_url.is_some(),
        mailgun_configured = config.mailgun_enabled(),
        "config_loaded"
    );

    if config.esign_api_token.is_none() {
        warn!("esign_token_not_configured");
    }

    // One HTTP client shared by the provider, print and mail integrations
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    let http = builder.build().context("Failed to build HTTP client")?;

    let client = EsignClient::with_http_client(http.clone(), &config.esign_api_url)
        .context("Failed to create e-signature client")?;

    let seed = match &config.seed_path {
        Some(path) => HostSeed::from_file(path)?,
        None => HostSeed::default(),
    };
    let memory = Arc::new(InMemoryHost::new(seed));

    let mailer: Option<Arc<dyn Mailer>> = match (&config.mailgun_api_key, &config.mailgun_domain) {
        (Some(key), Some(domain)) => Some(Arc::new(MailgunMailer::new(
            http.clone(),
            config.mailgun_api_url.clone(),
            domain.clone(),
            key.clone(),
            config.mail_from.clone(),
        ))),
        _ => {
            warn!("mail_delivery_not_configured");
            None
        }
    };

    let renderer: Option<Arc<dyn DocumentRenderer>> = match &config.print_url {
        Some(url) => Some(Arc::new(HttpPrintRenderer::new(http.clone(), url.clone()))),
        None => None,
    };

    let host = Host::in_memory(memory, mailer, renderer);
    let state = AppState::new(config.clone(), client, host);

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
