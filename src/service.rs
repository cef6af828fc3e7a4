// =============================================================================
// Analysis Service — batch orchestration over ticker symbols
// =============================================================================
//
// For every requested ticker symbol × period type:
//
//   1. Resolve the market / sector reference series through a run-scoped
//      cache (one fetch per "symbol:periodType" per run).
//   2. Fetch the ticker's candles.
//        full  : every candle, ascending
//        delta : the newest `minimum_required_candles()` candles
//   3. Optionally clear existing analysis (full mode only).
//   4. Run the analyzer set in order.
//   5. Persist in one batched write (full: every candle, delta: the newest).
//
// A failure while processing one ticker/period type is reported through the
// progress sink and the batch moves on.  Only an invalid option combination
// or a failure to resolve the ticker list aborts the run.
// =============================================================================

use std::collections::HashMap;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analyzers::{Analyzer, ReferenceSeries};
use crate::error::AnalysisError;
use crate::market_data::{Candle, CandleUpdate, TickerSymbol};
use crate::progress::{Benchmark, ProgressSink};
use crate::storage::{CandleStore, SortOrder};
use crate::types::PeriodType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub period_types: Vec<PeriodType>,
    pub reset_indicators_and_alerts: bool,
    pub delta_update: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            period_types: vec![PeriodType::Day],
            reset_indicators_and_alerts: false,
            delta_update: false,
        }
    }
}

/// Outcome of one `run_batch` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub run_id: Uuid,
    /// Ticker symbol × period type combinations scheduled.
    pub total_count: usize,
    pub processed: usize,
    pub failed: usize,
    pub rows_updated: usize,
    /// Requested names with no matching ticker symbol.
    pub unknown_ticker_symbols: Vec<String>,
}

// =============================================================================
// Reference cache
// =============================================================================

/// Reference candle series keyed by `"symbol:periodType"`, loaded lazily and
/// kept for the lifetime of one batch run.
#[derive(Default)]
pub struct ReferenceCache {
    series: HashMap<String, Vec<Candle>>,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(symbol: &str, period_type: PeriodType) -> String {
        format!("{symbol}:{period_type}")
    }

    /// Fetch the series for `symbol` unless it is already cached.
    pub async fn load<S: CandleStore>(
        &mut self,
        store: &S,
        symbol: &str,
        period_type: PeriodType,
    ) -> Result<()> {
        let key = Self::key(symbol, period_type);
        if self.series.contains_key(&key) {
            return Ok(());
        }
        let candles = store
            .candles_by_ticker_name(symbol, period_type, SortOrder::Ascending, None)
            .await
            .with_context(|| format!("failed to load reference series {key}"))?;
        debug!(reference = %key, candles = candles.len(), "reference series cached");
        self.series.insert(key, candles);
        Ok(())
    }

    /// Cached series, or `None` when it was never loaded or has no candles.
    pub fn get(&self, symbol: &str, period_type: PeriodType) -> Option<&[Candle]> {
        self.series
            .get(&Self::key(symbol, period_type))
            .map(Vec::as_slice)
            .filter(|s| !s.is_empty())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

// =============================================================================
// AnalysisService
// =============================================================================

pub struct AnalysisService<S> {
    store: S,
    analyzers: Vec<Box<dyn Analyzer>>,
    market_symbol: Option<String>,
}

impl<S: CandleStore> AnalysisService<S> {
    pub fn new(store: S, analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self {
            store,
            analyzers,
            market_symbol: None,
        }
    }

    /// Symbol of the market reference series (e.g. an index ETF).
    pub fn with_market_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.market_symbol = Some(symbol.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn analyzers(&self) -> &[Box<dyn Analyzer>] {
        &self.analyzers
    }

    /// Delta-mode window: the longest warm-up of the analyzer set.
    pub fn minimum_required_candles(&self) -> usize {
        self.analyzers
            .iter()
            .map(|a| a.minimum_required_candles())
            .max()
            .unwrap_or(1)
            .max(1)
    }

    pub async fn run_batch(
        &self,
        ticker_symbols: &[String],
        options: &BatchOptions,
        progress: &dyn ProgressSink,
    ) -> Result<BatchSummary> {
        if options.reset_indicators_and_alerts && options.delta_update {
            return Err(AnalysisError::ResetWithDeltaUpdate.into());
        }

        let run_id = Uuid::new_v4();
        let (tickers, unknown) = self.resolve_ticker_symbols(ticker_symbols).await?;

        let total = tickers.len() * options.period_types.len();
        info!(
            %run_id,
            tickers = tickers.len(),
            period_types = ?options.period_types,
            delta = options.delta_update,
            reset = options.reset_indicators_and_alerts,
            "starting analysis batch"
        );
        progress.on_start(run_id, total);
        for name in &unknown {
            progress.on_error(&AnalysisError::UnknownTickerSymbol(name.clone()).to_string(), name, None);
        }

        let mut summary = BatchSummary {
            run_id,
            total_count: total,
            processed: 0,
            failed: 0,
            rows_updated: 0,
            unknown_ticker_symbols: unknown,
        };
        let mut references = ReferenceCache::new();
        let mut index = 0;

        for ticker in &tickers {
            for &period_type in &options.period_types {
                progress.on_ticker_processing(&ticker.name, period_type, index, total);
                index += 1;

                match self
                    .process(ticker, period_type, options, &mut references, progress)
                    .await
                {
                    Ok(rows) => {
                        summary.processed += 1;
                        summary.rows_updated += rows;
                    }
                    Err(e) => {
                        summary.failed += 1;
                        warn!(ticker = %ticker.name, %period_type, error = %format!("{e:#}"), "analysis failed");
                        progress.on_error(&format!("{e:#}"), &ticker.name, Some(period_type));
                    }
                }
            }
        }

        info!(
            %run_id,
            processed = summary.processed,
            failed = summary.failed,
            rows_updated = summary.rows_updated,
            references = references.len(),
            "analysis batch complete"
        );
        progress.on_end(&summary);
        Ok(summary)
    }

    /// Explicit names keep caller order (first occurrence wins); an empty list
    /// means every active ticker symbol, ordered by name.
    async fn resolve_ticker_symbols(&self, names: &[String]) -> Result<(Vec<TickerSymbol>, Vec<String>)> {
        if names.is_empty() {
            let active = self
                .store
                .active_ticker_symbols()
                .await
                .context("failed to list active ticker symbols")?;
            return Ok((active, Vec::new()));
        }

        let found = self
            .store
            .ticker_symbols_by_name(names)
            .await
            .context("failed to resolve ticker symbols")?;

        let mut tickers: Vec<TickerSymbol> = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names {
            if tickers.iter().any(|t| &t.name == name) || unknown.contains(name) {
                continue;
            }
            match found.iter().find(|t| &t.name == name) {
                Some(t) => tickers.push(t.clone()),
                None => unknown.push(name.clone()),
            }
        }
        Ok((tickers, unknown))
    }

    /// Analyse and persist one ticker/period type; returns the rows updated.
    async fn process(
        &self,
        ticker: &TickerSymbol,
        period_type: PeriodType,
        options: &BatchOptions,
        references: &mut ReferenceCache,
        progress: &dyn ProgressSink,
    ) -> Result<usize> {
        let started = Instant::now();

        let market = self.market_symbol.as_deref();
        let sector = ticker.sector_symbol.as_deref();
        for symbol in [market, sector].into_iter().flatten() {
            references.load(&self.store, symbol, period_type).await?;
        }

        let mut candles = if options.delta_update {
            let mut newest = self
                .store
                .candles(
                    ticker.id,
                    period_type,
                    SortOrder::Descending,
                    Some(self.minimum_required_candles()),
                )
                .await?;
            newest.reverse();
            newest
        } else {
            self.store
                .candles(ticker.id, period_type, SortOrder::Ascending, None)
                .await?
        };
        if candles.is_empty() {
            return Err(AnalysisError::EmptySeries {
                ticker_symbol: ticker.name.clone(),
                period_type,
            }
            .into());
        }
        let fetch_ms = elapsed_ms(started);

        if options.reset_indicators_and_alerts {
            candles.iter_mut().for_each(Candle::clear_analysis);
        }

        let analyze_started = Instant::now();
        let series = ReferenceSeries {
            market: market.and_then(|s| references.get(s, period_type)),
            sector: sector.and_then(|s| references.get(s, period_type)),
        };
        for analyzer in &self.analyzers {
            analyzer
                .analyze(&mut candles, &series)
                .with_context(|| format!("{} analyzer failed", analyzer.name()))?;
        }
        let analyze_ms = elapsed_ms(analyze_started);

        let persist_started = Instant::now();
        let to_persist: &mut [Candle] = if options.delta_update {
            let last = candles.len() - 1;
            &mut candles[last..]
        } else {
            &mut candles
        };
        let rows = to_persist
            .iter_mut()
            .map(|c| {
                c.clear_scratch();
                CandleUpdate::from_candle(c)
            })
            .collect::<Result<Vec<_>>>()?;
        let updated = self
            .store
            .batch_update_indicators_and_alerts(&rows)
            .await
            .with_context(|| format!("failed to persist analysis for {} ({period_type})", ticker.name))?;
        let persist_ms = elapsed_ms(persist_started);

        progress.on_debug(&format!(
            "{} ({period_type}): analysed {} candles, updated {updated} rows",
            ticker.name,
            candles.len()
        ));
        progress.on_benchmark(
            &ticker.name,
            period_type,
            Benchmark {
                fetch_ms,
                analyze_ms,
                persist_ms,
                total_ms: elapsed_ms(started),
            },
        );
        Ok(updated)
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1_000.0
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::analyzers::fixtures::{candle_for, wavy};
    use crate::analyzers::{
        PriceActionAnalyzer, ReferenceKind, RelativeStrengthAnalyzer, RelativeVolumeAnalyzer,
        TrendCrossAnalyzer,
    };
    use crate::progress::recorder::RecordingProgress;
    use crate::progress::{NoProgress, ProgressEvent};
    use crate::storage::InMemoryCandleStore;

    fn exact_analyzers() -> Vec<Box<dyn Analyzer>> {
        vec![
            Box::new(TrendCrossAnalyzer::sma(&[(5, 10)])),
            Box::new(RelativeVolumeAnalyzer::new(10, 1.2)),
            Box::new(PriceActionAnalyzer::new()),
        ]
    }

    fn seeded_store(names: &[&str], n: usize) -> InMemoryCandleStore {
        let store = InMemoryCandleStore::new();
        for (i, name) in names.iter().enumerate() {
            let t = store.add_ticker_symbol(name, None);
            store.insert_candles(wavy(t.id, n, i as f64 * 0.7));
        }
        store
    }

    async fn all_candles(store: &InMemoryCandleStore, name: &str) -> Vec<Candle> {
        store
            .candles_by_ticker_name(name, PeriodType::Day, SortOrder::Ascending, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reset_with_delta_is_rejected_before_any_io() {
        let service = AnalysisService::new(seeded_store(&["AAPL"], 30), exact_analyzers());
        let progress = RecordingProgress::default();
        let options = BatchOptions {
            reset_indicators_and_alerts: true,
            delta_update: true,
            ..Default::default()
        };

        let err = service.run_batch(&[], &options, &progress).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<AnalysisError>(),
            Some(&AnalysisError::ResetWithDeltaUpdate)
        );
        assert!(progress.events().is_empty());
        assert_eq!(service.store().batch_update_calls(), 0);
    }

    #[tokio::test]
    async fn full_run_persists_every_candle_once_per_ticker() {
        let service = AnalysisService::new(seeded_store(&["AAPL", "MSFT"], 40), exact_analyzers());
        let summary = service
            .run_batch(&[], &BatchOptions::default(), &NoProgress)
            .await
            .unwrap();

        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.rows_updated, 80);
        assert_eq!(service.store().batch_update_calls(), 2);

        let candles = all_candles(service.store(), "MSFT").await;
        assert!(candles.iter().all(|c| c.has_indicator("sma_10")));
        assert!(candles[39].indicator("rvol_10").is_some());
    }

    #[tokio::test]
    async fn delta_run_persists_only_the_newest_candle() {
        let service = AnalysisService::new(seeded_store(&["AAPL"], 40), exact_analyzers());
        let options = BatchOptions {
            delta_update: true,
            ..Default::default()
        };
        let summary = service.run_batch(&[], &options, &NoProgress).await.unwrap();
        assert_eq!(summary.rows_updated, 1);
        assert_eq!(service.store().batch_update_calls(), 1);

        let candles = all_candles(service.store(), "AAPL").await;
        let analysed: Vec<usize> = (0..candles.len())
            .filter(|&i| !candles[i].indicators().is_empty())
            .collect();
        assert_eq!(analysed, vec![39]);
        assert_eq!(service.minimum_required_candles(), 11);
    }

    #[tokio::test]
    async fn delta_matches_full_for_newest_candle() {
        let full = AnalysisService::new(seeded_store(&["AAPL"], 60), exact_analyzers());
        let delta = AnalysisService::new(seeded_store(&["AAPL"], 60), exact_analyzers());

        full.run_batch(&[], &BatchOptions::default(), &NoProgress).await.unwrap();
        let options = BatchOptions {
            delta_update: true,
            ..Default::default()
        };
        delta.run_batch(&[], &options, &NoProgress).await.unwrap();

        let a = all_candles(full.store(), "AAPL").await;
        let b = all_candles(delta.store(), "AAPL").await;
        assert_eq!(a[59].indicators(), b[59].indicators());
        assert_eq!(a[59].alerts(), b[59].alerts());
    }

    fn exact_with_market_strength() -> Vec<Box<dyn Analyzer>> {
        let mut analyzers = exact_analyzers();
        analyzers.push(Box::new(RelativeStrengthAnalyzer::new(ReferenceKind::Market, 5, 2, 4)));
        analyzers
    }

    #[tokio::test]
    async fn appending_one_candle_per_delta_run_matches_full_run() {
        const SEEDED: usize = 20;
        const TOTAL: usize = 60;
        let names = vec!["AAPL".to_string()];

        let full_store = InMemoryCandleStore::new();
        let spy = full_store.add_ticker_symbol("SPY", None);
        let aapl = full_store.add_ticker_symbol("AAPL", None);
        let spy_series = wavy(spy.id, TOTAL, 2.0);
        let aapl_series = wavy(aapl.id, TOTAL, 0.0);
        full_store.insert_candles(spy_series.clone());
        full_store.insert_candles(aapl_series.clone());
        let full = AnalysisService::new(full_store, exact_with_market_strength()).with_market_symbol("SPY");
        full.run_batch(&names, &BatchOptions::default(), &NoProgress).await.unwrap();

        let delta_store = InMemoryCandleStore::new();
        assert_eq!(delta_store.add_ticker_symbol("SPY", None).id, spy.id);
        assert_eq!(delta_store.add_ticker_symbol("AAPL", None).id, aapl.id);
        delta_store.insert_candles(spy_series[..SEEDED].to_vec());
        delta_store.insert_candles(aapl_series[..SEEDED].to_vec());
        let delta = AnalysisService::new(delta_store, exact_with_market_strength()).with_market_symbol("SPY");
        let options = BatchOptions {
            delta_update: true,
            ..Default::default()
        };
        for i in SEEDED..TOTAL {
            delta.store().insert_candles([spy_series[i].clone()]);
            delta.store().insert_candles([aapl_series[i].clone()]);
            let summary = delta.run_batch(&names, &options, &NoProgress).await.unwrap();
            assert_eq!((summary.processed, summary.rows_updated), (1, 1), "step {i}");
        }

        let a = all_candles(full.store(), "AAPL").await;
        let b = all_candles(delta.store(), "AAPL").await;
        assert_eq!(a.len(), TOTAL);
        assert_eq!(b.len(), TOTAL);
        for i in SEEDED..TOTAL {
            assert_eq!(a[i].period(), b[i].period());
            assert_eq!(a[i].indicators(), b[i].indicators(), "indicators differ at {i}");
            assert_eq!(a[i].alerts(), b[i].alerts(), "alerts differ at {i}");
        }
        assert!(b[TOTAL - 1].indicator("vwrrs_market").is_some());
        assert!(b[TOTAL - 1].indicators().keys().all(|k| !k.starts_with("_scratch_")));
    }

    #[tokio::test]
    async fn empty_series_and_unknown_names_do_not_abort() {
        let store = seeded_store(&["AAPL"], 20);
        store.add_ticker_symbol("EMPTY", None);
        let service = AnalysisService::new(store, exact_analyzers());
        let progress = RecordingProgress::default();

        let names: Vec<String> = ["EMPTY", "NOPE", "AAPL"].iter().map(|s| s.to_string()).collect();
        let summary = service
            .run_batch(&names, &BatchOptions::default(), &progress)
            .await
            .unwrap();

        assert_eq!(summary.total_count, 2);
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unknown_ticker_symbols, vec!["NOPE"]);

        let errors = progress.errors();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.contains("unknown ticker symbol: NOPE")));
        assert!(errors.iter().any(|e| e.contains("no candles for EMPTY (day)")));

        // Caller order is kept.
        let processing: Vec<String> = progress
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::TickerProcessing { ticker_symbol, .. } => Some(ticker_symbol),
                _ => None,
            })
            .collect();
        assert_eq!(processing, vec!["EMPTY", "AAPL"]);
    }

    #[tokio::test]
    async fn unknown_names_are_reported_after_batch_start() {
        let service = AnalysisService::new(seeded_store(&["AAPL"], 20), exact_analyzers());
        let progress = RecordingProgress::default();

        let names: Vec<String> = ["NOPE", "AAPL"].iter().map(|s| s.to_string()).collect();
        service
            .run_batch(&names, &BatchOptions::default(), &progress)
            .await
            .unwrap();

        let events = progress.events();
        assert!(matches!(events[0], ProgressEvent::Start { total_count: 1, .. }));
        match &events[1] {
            ProgressEvent::Error {
                ticker_symbol,
                period_type,
                ..
            } => {
                assert_eq!(ticker_symbol, "NOPE");
                assert_eq!(*period_type, None);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(events[2], ProgressEvent::TickerProcessing { current_index: 0, .. }));
        assert!(matches!(events.last(), Some(ProgressEvent::End { total_count: 1, .. })));
    }

    #[tokio::test]
    async fn reset_clears_previous_analysis() {
        let store = InMemoryCandleStore::new();
        let t = store.add_ticker_symbol("AAPL", None);
        let stale = wavy(t.id, 15, 0.0).into_iter().map(|mut c| {
            c.set_indicator("stale_key", Some(1.0));
            c.add_alert("stale_alert");
            c
        });
        store.insert_candles(stale);
        let service = AnalysisService::new(store, exact_analyzers());

        service.run_batch(&[], &BatchOptions::default(), &NoProgress).await.unwrap();
        let kept = all_candles(service.store(), "AAPL").await;
        assert!(kept[0].has_indicator("stale_key"));
        assert!(kept[0].has_alert("stale_alert"));

        let options = BatchOptions {
            reset_indicators_and_alerts: true,
            ..Default::default()
        };
        service.run_batch(&[], &options, &NoProgress).await.unwrap();
        let reset = all_candles(service.store(), "AAPL").await;
        assert!(reset.iter().all(|c| !c.has_indicator("stale_key") && !c.has_alert("stale_alert")));
    }

    /// Delegates to an in-memory store and counts reference fetches.
    struct CountingStore {
        inner: InMemoryCandleStore,
        by_name: AtomicUsize,
    }

    impl CandleStore for CountingStore {
        async fn active_ticker_symbols(&self) -> Result<Vec<TickerSymbol>> {
            self.inner.active_ticker_symbols().await
        }

        async fn ticker_symbols_by_name(&self, names: &[String]) -> Result<Vec<TickerSymbol>> {
            self.inner.ticker_symbols_by_name(names).await
        }

        async fn candles(
            &self,
            ticker_symbol_id: i64,
            period_type: PeriodType,
            order: SortOrder,
            limit: Option<usize>,
        ) -> Result<Vec<Candle>> {
            self.inner.candles(ticker_symbol_id, period_type, order, limit).await
        }

        async fn candles_by_ticker_name(
            &self,
            name: &str,
            period_type: PeriodType,
            order: SortOrder,
            limit: Option<usize>,
        ) -> Result<Vec<Candle>> {
            self.by_name.fetch_add(1, Ordering::Relaxed);
            self.inner.candles_by_ticker_name(name, period_type, order, limit).await
        }

        async fn batch_update_indicators_and_alerts(&self, rows: &[CandleUpdate]) -> Result<usize> {
            self.inner.batch_update_indicators_and_alerts(rows).await
        }
    }

    fn relative_strength() -> Vec<Box<dyn Analyzer>> {
        vec![
            Box::new(RelativeStrengthAnalyzer::new(ReferenceKind::Market, 5, 2, 4)),
            Box::new(RelativeStrengthAnalyzer::new(ReferenceKind::Sector, 5, 2, 4)),
        ]
    }

    #[tokio::test]
    async fn reference_series_fetched_once_per_run() {
        let inner = InMemoryCandleStore::new();
        let spy = inner.add_ticker_symbol("SPY", None);
        let xlk = inner.add_ticker_symbol("XLK", None);
        inner.insert_candles(wavy(spy.id, 30, 2.0));
        inner.insert_candles(wavy(xlk.id, 30, 1.0));
        for name in ["AAPL", "MSFT", "NVDA"] {
            let t = inner.add_ticker_symbol(name, Some("XLK"));
            inner.insert_candles(wavy(t.id, 30, t.id as f64));
        }
        let store = CountingStore {
            inner,
            by_name: AtomicUsize::new(0),
        };
        let service = AnalysisService::new(store, relative_strength()).with_market_symbol("SPY");

        let summary = service
            .run_batch(&[], &BatchOptions::default(), &NoProgress)
            .await
            .unwrap();
        assert_eq!(summary.processed, 5);
        // One fetch for SPY:day and one for XLK:day.
        assert_eq!(service.store().by_name.load(Ordering::Relaxed), 2);

        let aapl = service
            .store()
            .candles_by_ticker_name("AAPL", PeriodType::Day, SortOrder::Ascending, None)
            .await
            .unwrap();
        assert!(aapl[29].indicator("vwrrs_market").is_some());
        assert!(aapl[29].indicator("vwrrs_sector").is_some());
        assert!(aapl[29].indicators().keys().all(|k| !k.starts_with("_scratch_")));
    }

    #[tokio::test]
    async fn misaligned_reference_fails_only_that_ticker() {
        let store = InMemoryCandleStore::new();
        let spy = store.add_ticker_symbol("SPY", None);
        // Market series skips day 10 and runs one day longer.
        let day_10 = candle_for(spy.id, 10, 0.0, 0.0, 0.0, 0.0, 0).period();
        store.insert_candles(wavy(spy.id, 31, 0.0).into_iter().filter(|c| c.period() != day_10));
        // Days 20..=30 line up with the tail of the market series.
        let good = store.add_ticker_symbol("GOOD", None);
        store.insert_candles(wavy(good.id, 31, 1.0).split_off(20));
        let bad = store.add_ticker_symbol("BAD", None);
        store.insert_candles(wavy(bad.id, 30, 1.0));

        let service = AnalysisService::new(store, relative_strength()).with_market_symbol("SPY");
        let progress = RecordingProgress::default();
        let summary = service
            .run_batch(&["BAD".into(), "GOOD".into()], &BatchOptions::default(), &progress)
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed, 1);
        let errors = progress.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("misaligned"));
    }
}
