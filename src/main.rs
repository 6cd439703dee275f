use anyhow::{bail, Context, Result};
use document_gate::{DocumentApi, GateConfig};
use serde_json::Value;
use std::io::Read;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = std::env::args().skip(1);
    let (Some(signature), source) = (args.next(), args.next()) else {
        bail!("usage: document-gate <signature> [document.json]  (reads stdin without a file)");
    };

    let raw = match source.as_deref() {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("Failed to read stdin")?;
            buf
        }
    };
    let document: Value = serde_json::from_str(&raw).context("Document is not valid JSON")?;

    let config = GateConfig::from_env();
    let api = DocumentApi::from_config(&config)?;
    info!(
        "Submitting to {} (limit {} per {:?})",
        api.transport().endpoint(),
        config.capacity,
        config.window
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    api.submit_with_cancel(&document, &signature, &cancel).await?;
    info!("Document submitted");

    Ok(())
}
