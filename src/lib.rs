// =============================================================================
// Candle Analysis Engine
// =============================================================================
//
// Streaming indicators, analyzers that turn OHLCV candle series into
// indicator values and alerts, and the batch service that runs them across
// ticker symbols and persists the results.
// =============================================================================

pub mod analyzers;
pub mod config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod progress;
pub mod service;
pub mod storage;
pub mod types;

pub use error::AnalysisError;
