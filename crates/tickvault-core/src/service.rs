//! Service facade wiring the calendar, store, resolver, and correlation
//! engine together. The CLI and the capture task only talk to this type.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;

use crate::calendar::{CalendarError, TradingCalendar};
use crate::config::CoreConfig;
use crate::correlation::{CorrelationEngine, CorrelationError, CorrelationRequest, CorrelationResult};
use crate::domain::{InstrumentCode, Snapshot, TradingStatus};
use crate::feed::MarketFeed;
use crate::resolver::{QuoteResolver, ResolveError, ResolvedQuote};
use crate::snapshot::SnapshotStore;

/// Outcome of one capture sweep over a list of instruments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureReport {
    pub recorded: Vec<InstrumentCode>,
    pub failed: Vec<CaptureFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureFailure {
    pub code: InstrumentCode,
    pub reason: String,
}

#[derive(Clone)]
pub struct MarketService {
    calendar: Arc<TradingCalendar>,
    store: SnapshotStore,
    feed: Arc<dyn MarketFeed>,
    resolver: QuoteResolver,
    correlation: CorrelationEngine,
}

impl MarketService {
    /// Build the service against the configured data directory: the holiday
    /// table and the snapshot log are both loaded from disk.
    pub fn new(config: &CoreConfig, feed: Arc<dyn MarketFeed>) -> Self {
        let calendar = Arc::new(TradingCalendar::load(&config.holiday_path()));
        let store = SnapshotStore::open(&config.snapshot_path(), config.snapshot_retention);
        Self::assemble(calendar, store, feed, config.fetch_timeout())
    }

    /// Fully volatile service for tests and mock runs.
    pub fn in_memory(feed: Arc<dyn MarketFeed>) -> Self {
        Self::assemble(
            Arc::new(TradingCalendar::default()),
            SnapshotStore::in_memory(),
            feed,
            CoreConfig::default().fetch_timeout(),
        )
    }

    fn assemble(
        calendar: Arc<TradingCalendar>,
        store: SnapshotStore,
        feed: Arc<dyn MarketFeed>,
        fetch_timeout: std::time::Duration,
    ) -> Self {
        let resolver = QuoteResolver::new(
            Arc::clone(&feed),
            Arc::clone(&calendar),
            store.clone(),
            fetch_timeout,
        );
        let correlation = CorrelationEngine::new(Arc::clone(&feed));

        Self {
            calendar,
            store,
            feed,
            resolver,
            correlation,
        }
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn trading_status(&self) -> Result<TradingStatus, CalendarError> {
        self.trading_status_at(OffsetDateTime::now_utc())
    }

    /// Market status at the given instant: trading-day verdict, session
    /// phase, and the most recent prior trading day.
    pub fn trading_status_at(&self, at: OffsetDateTime) -> Result<TradingStatus, CalendarError> {
        let local_date = self.calendar.to_local(at).date();
        let day = self.calendar.trading_day(local_date);
        let previous_trading_day = self.calendar.previous_trading_day(local_date)?;

        Ok(TradingStatus {
            date: local_date,
            is_trading_day: day.is_trading_day,
            holiday: self.calendar.holiday_name(local_date).map(str::to_owned),
            session: self.calendar.session_state(at),
            previous_trading_day,
        })
    }

    pub async fn resolve_quote(&self, code: &InstrumentCode) -> Result<ResolvedQuote, ResolveError> {
        self.resolver.resolve(code).await
    }

    pub async fn resolve_quote_at(
        &self,
        code: &InstrumentCode,
        at: OffsetDateTime,
    ) -> Result<ResolvedQuote, ResolveError> {
        self.resolver.resolve_at(code, at).await
    }

    pub async fn compute_correlation(
        &self,
        request: &CorrelationRequest,
    ) -> Result<CorrelationResult, CorrelationError> {
        self.correlation.compute(request).await
    }

    /// Capture one snapshot per instrument, continuing past per-instrument
    /// failures so one bad code cannot starve the rest of the sweep.
    pub async fn capture_snapshots(&self, codes: &[InstrumentCode]) -> CaptureReport {
        let captured_at = OffsetDateTime::now_utc();
        let mut report = CaptureReport::default();

        for code in codes {
            match self.feed.quote(code).await {
                Ok(payload) => {
                    let snapshot = Snapshot {
                        code: code.clone(),
                        captured_at,
                        payload,
                    };
                    match self.store.record(snapshot).await {
                        Ok(()) => report.recorded.push(code.clone()),
                        Err(error) => report.failed.push(CaptureFailure {
                            code: code.clone(),
                            reason: error.to_string(),
                        }),
                    }
                }
                Err(error) => {
                    tracing::warn!(code = %code, %error, "capture fetch failed");
                    report.failed.push(CaptureFailure {
                        code: code.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            recorded = report.recorded.len(),
            failed = report.failed.len(),
            "capture sweep finished"
        );
        report
    }
}
