//! Print the eSignatures.com template list as JSON.
//!
//! Operators use this to find template ids when configuring documents.
//! Logs go to stderr; the JSON list goes to stdout.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use esign::{Config, EsignClient};

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    let token = config.api_token()?;

    let client = EsignClient::new(&config.esign_api_url, config.request_timeout())
        .context("Failed to create e-signature client")?;

    let templates = client.list_templates(token).await;
    info!(count = templates.len(), "templates_fetched");

    println!(
        "{}",
        serde_json::to_string_pretty(&templates).context("Failed to serialize templates")?
    );

    Ok(())
}
