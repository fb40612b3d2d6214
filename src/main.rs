//! propval: property valuation & market data service
//!
//! Entry point. Loads configuration, initialises structured logging,
//! builds the upstream clients and the borough dataset cache, warms the
//! cache, and serves the HTTP API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use propval::api::{self, ApiState};
use propval::clients::address::AddressResolver;
use propval::clients::valuation::ValuationClient;
use propval::config::{self, DatasetLocation};
use propval::market::format::GbpFormatter;
use propval::market::source::{FileDatasetSource, HttpDatasetSource};
use propval::market::{DatasetSource, LoadOutcome, MarketDataAggregator};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::var("PROPVAL_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    info!(
        config = %config_path,
        port = cfg.server.port,
        address_service = %cfg.upstream.address_base_url,
        valuation_service = %cfg.upstream.valuation_base_url,
        "propval starting up"
    );

    // -- Initialise components -------------------------------------------

    let timeout = cfg.upstream.timeout();
    let addresses = AddressResolver::new(cfg.upstream.address_base_url.clone(), timeout)?;

    let api_key = cfg.upstream.valuation_api_key();
    if cfg.upstream.valuation_api_key_env.is_some() && api_key.is_none() {
        warn!("Valuation API key env var configured but not set; calling without auth");
    }
    let valuations = ValuationClient::new(cfg.upstream.valuation_base_url.clone(), api_key, timeout)?;

    let source: Box<dyn DatasetSource> = match cfg.market_data.location() {
        DatasetLocation::File(path) => Box::new(FileDatasetSource::new(path)),
        DatasetLocation::Url(url) => Box::new(HttpDatasetSource::new(url, timeout)?),
    };
    let market = Arc::new(MarketDataAggregator::new(source));

    // Warm the dataset cache so the first stats request doesn't pay for it.
    match market.ensure_loaded().await {
        LoadOutcome::Loaded(records) => info!(boroughs = records.len(), "Market data ready"),
        LoadOutcome::FellBack { records, reason } => warn!(
            boroughs = records.len(),
            reason = %reason,
            "Market data running on fallback dataset"
        ),
        LoadOutcome::Failed { reason } => warn!(reason = %reason, "Market data unavailable"),
    }
    if let Ok(stats) = market.compute_stats().await {
        let loaded_at = market.loaded_at().map(|t| t.to_rfc3339()).unwrap_or_default();
        info!(loaded_at = %loaded_at, "Market summary: {stats}");
    }

    let state = Arc::new(ApiState {
        addresses: Arc::new(addresses),
        valuations: Arc::new(valuations),
        market,
        formatter: Arc::new(GbpFormatter),
    });

    // -- Serve -----------------------------------------------------------

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received.");
        }
    };

    api::serve(state, &cfg.server.host, cfg.server.port, shutdown).await?;
    info!("propval shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("propval=info"));

    let json_logging = std::env::var("PROPVAL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
