//! PDF Summarizer - Entry point
//!
//! Serves the summarize handler over HTTP.

use clap::Parser;
use pdf_summarizer::{run_server, AppConfig, Args};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_summarizer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_args(Args::parse())?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        store = ?config.store.backend,
        model = %config.completion.model,
        id_policy = ?config.ids.policy,
        "Starting PDF summarizer"
    );

    run_server(config).await
}
