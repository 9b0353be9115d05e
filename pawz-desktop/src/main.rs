//! `pawz`: runs the pet host headless, logging what a renderer would draw.

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use pawz_chat::LlmClient;
use pawz_desktop::{PetApp, config, logging, runner};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, source) = config::load()?;
    logging::init(&config.general)?;
    info!(source = ?source, "Configuration loaded");

    let client = LlmClient::from_config(&config.chat)?;
    info!(provider = ?client.provider(), "Chat backend ready");

    let mut app = PetApp::new(config, client, Utc::now())?;
    app.startup(Utc::now())?;

    runner::run(&mut app, ctrl_c()).await?;
    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
