// =============================================================================
// Batch progress reporting
// =============================================================================
//
// The analysis service reports what it is doing through an injected
// `ProgressSink`.  Every named callback builds a `ProgressEvent` and hands it
// to `emit`, so a sink normally implements `emit` alone:
//
//   TracingProgress   renders events as log lines
//   ChannelProgress   forwards events over a tokio channel (e.g. to a UI feed)
//
// Events serialise with an `event` tag: batch:start, ticker:processing,
// ticker:error, debug, benchmarks, batch:end.  Field names are camelCase
// (`tickerSymbol`, `currentIndex`, `totalCount`, `totalMs`, ...).
// =============================================================================

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::service::BatchSummary;
use crate::types::PeriodType;

/// Wall-clock timings of one ticker/period-type step, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Benchmark {
    pub fetch_ms: f64,
    pub analyze_ms: f64,
    pub persist_ms: f64,
    pub total_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum ProgressEvent {
    #[serde(rename = "batch:start", rename_all = "camelCase")]
    Start { run_id: Uuid, total_count: usize },

    #[serde(rename = "ticker:processing", rename_all = "camelCase")]
    TickerProcessing {
        ticker_symbol: String,
        period_type: PeriodType,
        current_index: usize,
        total_count: usize,
    },

    #[serde(rename = "ticker:error", rename_all = "camelCase")]
    Error {
        message: String,
        ticker_symbol: String,
        period_type: Option<PeriodType>,
    },

    #[serde(rename = "debug")]
    Debug { message: String },

    #[serde(rename = "benchmarks", rename_all = "camelCase")]
    Benchmarks {
        ticker_symbol: String,
        period_type: PeriodType,
        #[serde(flatten)]
        timings: Benchmark,
    },

    #[serde(rename = "batch:end", rename_all = "camelCase")]
    End {
        total_count: usize,
        summary: BatchSummary,
    },
}

pub trait ProgressSink: Send + Sync {
    /// Receive one event. The default drops it.
    fn emit(&self, _event: ProgressEvent) {}

    fn on_start(&self, run_id: Uuid, total_count: usize) {
        self.emit(ProgressEvent::Start { run_id, total_count });
    }

    fn on_ticker_processing(
        &self,
        ticker_symbol: &str,
        period_type: PeriodType,
        current_index: usize,
        total_count: usize,
    ) {
        self.emit(ProgressEvent::TickerProcessing {
            ticker_symbol: ticker_symbol.to_string(),
            period_type,
            current_index,
            total_count,
        });
    }

    fn on_error(&self, message: &str, ticker_symbol: &str, period_type: Option<PeriodType>) {
        self.emit(ProgressEvent::Error {
            message: message.to_string(),
            ticker_symbol: ticker_symbol.to_string(),
            period_type,
        });
    }

    fn on_debug(&self, message: &str) {
        self.emit(ProgressEvent::Debug {
            message: message.to_string(),
        });
    }

    fn on_benchmark(&self, ticker_symbol: &str, period_type: PeriodType, timings: Benchmark) {
        self.emit(ProgressEvent::Benchmarks {
            ticker_symbol: ticker_symbol.to_string(),
            period_type,
            timings,
        });
    }

    fn on_end(&self, summary: &BatchSummary) {
        self.emit(ProgressEvent::End {
            total_count: summary.total_count,
            summary: summary.clone(),
        });
    }
}

/// Discards every event.
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Writes every event to the `tracing` subscriber.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Start { run_id, total_count } => {
                info!(%run_id, total_count, "analysis batch started");
            }
            ProgressEvent::TickerProcessing {
                ticker_symbol,
                period_type,
                current_index,
                total_count,
            } => {
                info!(
                    ticker = %ticker_symbol,
                    %period_type,
                    "[{}/{}] analysing",
                    current_index + 1,
                    total_count
                );
            }
            ProgressEvent::Error {
                message,
                ticker_symbol,
                period_type,
            } => match period_type {
                Some(pt) => error!(ticker = %ticker_symbol, period_type = %pt, "{message}"),
                None => error!(ticker = %ticker_symbol, "{message}"),
            },
            ProgressEvent::Debug { message } => debug!("{message}"),
            ProgressEvent::Benchmarks {
                ticker_symbol,
                period_type,
                timings,
            } => {
                debug!(
                    ticker = %ticker_symbol,
                    %period_type,
                    fetch_ms = timings.fetch_ms,
                    analyze_ms = timings.analyze_ms,
                    persist_ms = timings.persist_ms,
                    total_ms = timings.total_ms,
                    "timings"
                );
            }
            ProgressEvent::End { total_count, summary } => {
                info!(
                    run_id = %summary.run_id,
                    total_count,
                    processed = summary.processed,
                    failed = summary.failed,
                    rows_updated = summary.rows_updated,
                    "analysis batch finished"
                );
            }
        }
    }
}

/// Forwards events over an unbounded channel.  Events are dropped once the
/// receiver is gone.
pub struct ChannelProgress {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgress {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}
