//! Company scoring API server.
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │              COMPANY SCORING API             │
//!     Client Request      │  ┌──────────┐   ┌───────────┐   ┌─────────┐  │
//!     ────────────────────┼─▶│ trace +  │──▶│ admission │──▶│ routing │  │
//!                         │  │ req. id  │   │ (429)     │   │ + auth  │  │
//!                         │  └──────────┘   └───────────┘   └────┬────┘  │
//!                         │                                      │       │
//!                         │                      ┌───────────────┴─┐     │
//!                         │                      ▼                 ▼     │
//!                         │               ┌────────────┐   ┌──────────┐  │
//!                         │               │ data store │   │ scoring  │  │
//!                         │               │  client    │   │ client   │  │
//!                         │               └─────┬──────┘   └────┬─────┘  │
//!                         └─────────────────────┼───────────────┼────────┘
//!                                               ▼               ▼
//!                                          PostgREST     chat completions
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use company_scoring_api::config::{layered, load_config_with};
use company_scoring_api::lifecycle::{wait_for_signal, Shutdown};
use company_scoring_api::observability::{logging, metrics};
use company_scoring_api::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "company-scoring-api")]
#[command(about = "List, score and update company records", long_about = None)]
struct Args {
    /// Path to a TOML config file. Environment variables override it.
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Bind address, overriding config and BIND_ADDRESS.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let flags: Vec<(&'static str, String)> = args
        .bind
        .into_iter()
        .map(|bind| ("BIND_ADDRESS", bind))
        .collect();
    let config = load_config_with(
        args.config.as_deref(),
        layered(&flags, |key| std::env::var(key).ok()),
    )?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "company-scoring-api starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rate_limit_enabled = config.rate_limit.enabled,
        max_requests = config.rate_limit.max_requests,
        window_seconds = config.rate_limit.window_seconds,
        data_store_configured = config.data_store.url.is_some(),
        api_key_configured = config.auth.api_key.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
