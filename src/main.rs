//! News aggregation service: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, the query facade, and metrics.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newsfeed_aggregator::api::{self, AppState};
use newsfeed_aggregator::config::load_config_default;
use newsfeed_aggregator::metrics::Metrics;

/// Compact logs by default; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsfeed_aggregator=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default().context("loading news config")?;
    // Safe diagnostics: key lengths only.
    tracing::info!(
        newsapi_key_len = cfg.keys.newsapi.len(),
        guardian_key_len = cfg.keys.guardian.len(),
        nyt_key_len = cfg.keys.nyt.len(),
        provider_timeout_ms = cfg.provider_timeout_ms,
        "news config loaded"
    );

    let metrics = Metrics::init(cfg.provider_timeout_ms)?;
    let facade = newsfeed_aggregator::build_facade(&cfg)?;

    let app = api::router(AppState { facade }).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
