// =============================================================================
// Domain errors
// =============================================================================
//
// Plumbing failures (storage, JSON, files) travel as `anyhow::Error`.  The
// cases callers need to tell apart are typed here.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::types::PeriodType;

#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    /// Resetting history on a truncated delta window is meaningless.
    #[error("reset_indicators_and_alerts cannot be combined with delta_update")]
    ResetWithDeltaUpdate,

    /// Reference candle does not line up with the source candle at `index`.
    #[error(
        "reference series misaligned at index {index}: source {source_period} ({source_type}) \
         vs reference {reference_period} ({reference_type})"
    )]
    ReferenceMisaligned {
        index: usize,
        source_period: DateTime<Utc>,
        source_type: PeriodType,
        reference_period: DateTime<Utc>,
        reference_type: PeriodType,
    },

    /// Reference series cannot cover the source series.
    #[error("reference series has {reference_len} candles but the source has {source_len}")]
    ReferenceTooShort {
        source_len: usize,
        reference_len: usize,
    },

    #[error("no candles for {ticker_symbol} ({period_type})")]
    EmptySeries {
        ticker_symbol: String,
        period_type: PeriodType,
    },

    #[error("unknown ticker symbol: {0}")]
    UnknownTickerSymbol(String),
}
