// =============================================================================
// In-memory candle store
// =============================================================================
//
// Lock-protected vectors behind the `CandleStore` trait.  Used for dry runs
// and by the service tests, which also read the batch-update counter to check
// that each ticker/period type persists in exactly one call.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use anyhow::{bail, Result};
use parking_lot::RwLock;

use super::{CandleStore, SortOrder};
use crate::market_data::{parse_alerts, parse_indicators, Candle, CandleUpdate, TickerSymbol};
use crate::types::PeriodType;

pub struct InMemoryCandleStore {
    ticker_symbols: RwLock<Vec<TickerSymbol>>,
    candles: RwLock<Vec<Candle>>,
    next_ticker_id: AtomicI64,
    next_candle_id: AtomicI64,
    batch_update_calls: AtomicU64,
}

impl Default for InMemoryCandleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCandleStore {
    pub fn new() -> Self {
        Self {
            ticker_symbols: RwLock::new(Vec::new()),
            candles: RwLock::new(Vec::new()),
            next_ticker_id: AtomicI64::new(1),
            next_candle_id: AtomicI64::new(1),
            batch_update_calls: AtomicU64::new(0),
        }
    }

    /// Register an active ticker symbol and return it with its new id.
    pub fn add_ticker_symbol(&self, name: &str, sector_symbol: Option<&str>) -> TickerSymbol {
        let symbol = TickerSymbol {
            id: self.next_ticker_id.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            sector_symbol: sector_symbol.map(str::to_string),
            active: true,
        };
        self.ticker_symbols.write().push(symbol.clone());
        symbol
    }

    pub fn set_active(&self, name: &str, active: bool) {
        for symbol in self.ticker_symbols.write().iter_mut() {
            if symbol.name == name {
                symbol.active = active;
            }
        }
    }

    /// Store `candles`, assigning ids to those that have none.
    pub fn insert_candles(&self, candles: impl IntoIterator<Item = Candle>) {
        let mut stored = self.candles.write();
        for candle in candles {
            let candle = if candle.id() == 0 {
                let id = self.next_candle_id.fetch_add(1, Ordering::Relaxed);
                candle.with_id(id)
            } else {
                candle
            };
            stored.push(candle);
        }
    }

    /// Number of `batch_update_indicators_and_alerts` calls so far.
    pub fn batch_update_calls(&self) -> u64 {
        self.batch_update_calls.load(Ordering::Relaxed)
    }

    fn select(
        &self,
        ticker_symbol_id: i64,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Vec<Candle> {
        let mut selected: Vec<Candle> = self
            .candles
            .read()
            .iter()
            .filter(|c| c.ticker_symbol_id() == ticker_symbol_id && c.period_type() == period_type)
            .cloned()
            .collect();
        selected.sort_by_key(|c| c.period());
        if order == SortOrder::Descending {
            selected.reverse();
        }
        if let Some(limit) = limit {
            selected.truncate(limit);
        }
        selected
    }
}

impl CandleStore for InMemoryCandleStore {
    async fn active_ticker_symbols(&self) -> Result<Vec<TickerSymbol>> {
        let mut active: Vec<TickerSymbol> = self
            .ticker_symbols
            .read()
            .iter()
            .filter(|s| s.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }

    async fn ticker_symbols_by_name(&self, names: &[String]) -> Result<Vec<TickerSymbol>> {
        Ok(self
            .ticker_symbols
            .read()
            .iter()
            .filter(|s| names.contains(&s.name))
            .cloned()
            .collect())
    }

    async fn candles(
        &self,
        ticker_symbol_id: i64,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>> {
        Ok(self.select(ticker_symbol_id, period_type, order, limit))
    }

    async fn candles_by_ticker_name(
        &self,
        name: &str,
        period_type: PeriodType,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>> {
        let id = self
            .ticker_symbols
            .read()
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id);
        Ok(match id {
            Some(id) => self.select(id, period_type, order, limit),
            None => Vec::new(),
        })
    }

    async fn batch_update_indicators_and_alerts(&self, rows: &[CandleUpdate]) -> Result<usize> {
        self.batch_update_calls.fetch_add(1, Ordering::Relaxed);

        // Parse everything first so a bad row leaves the store untouched.
        let mut parsed = Vec::with_capacity(rows.len());
        for row in rows {
            parsed.push((
                row.candle_id,
                parse_indicators(&row.indicators_json)?,
                parse_alerts(&row.alerts_json)?,
            ));
        }

        let mut stored = self.candles.write();
        let mut updated = 0;
        for (id, indicators, alerts) in parsed {
            let Some(slot) = stored.iter_mut().find(|c| c.id() == id) else {
                continue;
            };
            *slot = slot.clone().with_analysis(indicators, alerts);
            updated += 1;
        }
        if updated == 0 && !rows.is_empty() {
            bail!("none of the {} candle ids exist", rows.len());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::fixtures::candle_for;

    fn seeded() -> (InMemoryCandleStore, TickerSymbol) {
        let store = InMemoryCandleStore::new();
        let aapl = store.add_ticker_symbol("AAPL", Some("XLK"));
        store.insert_candles((0..5).map(|d| candle_for(aapl.id, d, 1.0, 2.0, 0.5, 1.5, 10)));
        (store, aapl)
    }

    #[tokio::test]
    async fn descending_fetch_with_limit_returns_newest() {
        let (store, aapl) = seeded();
        let newest = store
            .candles(aapl.id, PeriodType::Day, SortOrder::Descending, Some(2))
            .await
            .unwrap();
        assert_eq!(newest.len(), 2);
        assert!(newest[0].period() > newest[1].period());

        let all = store
            .candles_by_ticker_name("AAPL", PeriodType::Day, SortOrder::Ascending, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[4].period(), newest[0].period());
    }

    #[tokio::test]
    async fn unknown_names_are_absent() {
        let (store, _) = seeded();
        let found = store
            .ticker_symbols_by_name(&["AAPL".into(), "NOPE".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        let none = store
            .candles_by_ticker_name("NOPE", PeriodType::Day, SortOrder::Ascending, None)
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn active_symbols_sorted_by_name() {
        let store = InMemoryCandleStore::new();
        store.add_ticker_symbol("MSFT", None);
        store.add_ticker_symbol("AAPL", None);
        store.add_ticker_symbol("IBM", None);
        store.set_active("IBM", false);
        let names: Vec<String> = store
            .active_ticker_symbols()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["AAPL", "MSFT"]);
    }

    #[tokio::test]
    async fn batch_update_writes_analysis_and_counts_calls() {
        let (store, aapl) = seeded();
        let mut candles = store
            .candles(aapl.id, PeriodType::Day, SortOrder::Ascending, None)
            .await
            .unwrap();
        candles[0].set_indicator("rvol_20", None);
        candles[0].add_alert("inside_inside");
        let row = CandleUpdate::from_candle(&candles[0]).unwrap();

        assert_eq!(store.batch_update_indicators_and_alerts(&[row]).await.unwrap(), 1);
        assert_eq!(store.batch_update_calls(), 1);

        let reread = store
            .candles(aapl.id, PeriodType::Day, SortOrder::Ascending, Some(1))
            .await
            .unwrap();
        assert!(reread[0].has_indicator("rvol_20"));
        assert!(reread[0].has_alert("inside_inside"));
    }
}
