pub mod candle;

// Re-export the candle types for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{parse_alerts, parse_indicators, Candle, CandleUpdate, TickerSymbol, SCRATCH_PREFIX};
