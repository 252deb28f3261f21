use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use tracker_api::ApiClient;
use tracker_daemon::{config::DaemonConfig, service::TrackerService};

#[derive(Debug, Parser)]
#[command(
    name = "tracker-daemon",
    version,
    about = "Regression tracking daemon for CI job results"
)]
struct Cli {
    /// Base URL of the results API, e.g. http://127.0.0.1:8001
    #[arg(long, default_value = "http://127.0.0.1:8001")]
    api_url: String,

    /// API bearer token. Falls back to the API_TOKEN environment variable.
    #[arg(long)]
    api_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig {
        api_url: cli.api_url,
        api_token: cli.api_token.or_else(|| std::env::var("API_TOKEN").ok()),
    };

    info!("starting tracker against {}", config.api_url);

    let api = Arc::new(ApiClient::new(
        config.api_url.clone(),
        config.api_token.clone(),
    ));
    let service = TrackerService::new(api);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    service.run(shutdown_rx).await
}
