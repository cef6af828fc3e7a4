// =============================================================================
// Candle storage
// =============================================================================
//
// The analysis service reads candles and writes analysis output through the
// `CandleStore` trait.  Two implementations ship with the crate:
//
//   SqliteCandleStore    rusqlite-backed, used by the binary
//   InMemoryCandleStore  lock-protected vectors, for dry runs and tests
//
// Persisted shape of the analysis columns:
//   indicators  JSON object  { "<key>": number | null }
//   alerts      JSON array   [ "<key>", ... ]

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryCandleStore;
pub use sqlite::SqliteCandleStore;

use anyhow::Result;

use crate::market_data::{Candle, CandleUpdate, TickerSymbol};
use crate::types::PeriodType;

/// Ordering of a candle fetch by `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Storage collaborator of the analysis service.
#[allow(async_fn_in_trait)]
pub trait CandleStore {
    /// Every active ticker symbol, ordered by name.
    async fn active_ticker_symbols(&self) -> Result<Vec<TickerSymbol>>;

    /// Ticker symbols matching `names`.  Unknown names are simply absent.
    async fn ticker_symbols_by_name(&self, names: &[String]) -> Result<Vec<TickerSymbol>>;

    /// Candles of one ticker symbol and period type, sorted by period.
    async fn candles(
        &self,
        ticker_symbol_id: i64,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>>;

    /// As [`CandleStore::candles`], looking the ticker up by name.  An
    /// unknown name yields no candles.
    async fn candles_by_ticker_name(
        &self,
        name: &str,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>>;

    /// Write `indicators`/`alerts` for every row in one batched operation and
    /// return the number of rows updated.
    async fn batch_update_indicators_and_alerts(&self, rows: &[CandleUpdate]) -> Result<usize>;
}
