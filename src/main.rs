// =============================================================================
// candle-analysis — batch entry point
// =============================================================================
//
// Loads `.env` and `candle_analysis.json`, opens the candle database, runs one
// analysis batch and logs the summary.  Exits non-zero only when the batch
// cannot start; per-ticker failures are logged and counted.
// =============================================================================

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use candle_analysis::config::{EngineConfig, DEFAULT_CONFIG_PATH};
use candle_analysis::progress::TracingProgress;
use candle_analysis::service::AnalysisService;
use candle_analysis::storage::SqliteCandleStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("CANDLE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = EngineConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        EngineConfig::default()
    });
    config.apply_env_overrides()?;

    info!(
        database = %config.database_path,
        tickers = ?config.ticker_symbols,
        period_types = ?config.period_types,
        delta = config.delta_update,
        reset = config.reset_indicators_and_alerts,
        "Configured analysis batch"
    );

    // ── 2. Storage & analyzers ───────────────────────────────────────────
    let store = SqliteCandleStore::open(&config.database_path)?;
    let analyzers = config.analyzers.build();
    info!(
        analyzers = ?analyzers.iter().map(|a| a.name().to_string()).collect::<Vec<_>>(),
        "Analyzer set built"
    );

    let mut service = AnalysisService::new(store, analyzers);
    if let Some(market) = &config.market_symbol {
        service = service.with_market_symbol(market.clone());
    }

    // ── 3. Run ───────────────────────────────────────────────────────────
    let summary = service
        .run_batch(&config.ticker_symbols, &config.batch_options(), &TracingProgress)
        .await?;

    info!(
        run_id = %summary.run_id,
        total = summary.total_count,
        processed = summary.processed,
        failed = summary.failed,
        rows_updated = summary.rows_updated,
        unknown = ?summary.unknown_ticker_symbols,
        "Batch finished"
    );
    Ok(())
}
