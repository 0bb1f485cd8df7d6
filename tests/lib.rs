// Shared fixtures for the behavior test suites.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};

use time::Date;

pub use std::sync::Arc;
pub use tickvault_core::{
    DailyBar, FeedError, InstrumentCode, MarketFeed, QuotePayload, Snapshot, SnapshotStore,
    TradingCalendar,
};

pub fn code(raw: &str) -> InstrumentCode {
    InstrumentCode::parse(raw).expect("valid code")
}

pub fn payload(raw_code: &str, price: f64) -> QuotePayload {
    QuotePayload::new(
        code(raw_code),
        format!("fixture-{raw_code}"),
        price,
        0.5,
        0.5 / price * 100.0,
        price - 0.5,
        price + 1.0,
        (price - 1.0).max(0.0),
        price - 0.5,
        10_000.0,
        10_000.0 * price,
        1.2,
    )
    .expect("valid payload")
}

pub fn bar(date: Date, close: f64, turnover: f64, change: f64) -> DailyBar {
    DailyBar::new(
        date,
        close,
        close,
        close + 1.0,
        (close - 1.0).max(0.0),
        1_000.0,
        1_000.0 * close,
        2.0,
        change,
        turnover,
    )
    .expect("valid bar")
}

/// Feed stub scripted per instrument: a quote result, a history, and a call
/// counter so tests can assert whether the feed was consulted at all.
#[derive(Default)]
pub struct ScriptedFeed {
    quotes: BTreeMap<InstrumentCode, Result<QuotePayload, FeedError>>,
    histories: BTreeMap<InstrumentCode, Vec<DailyBar>>,
    quote_calls: AtomicUsize,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, payload: QuotePayload) -> Self {
        self.quotes.insert(payload.code.clone(), Ok(payload));
        self
    }

    pub fn with_failing_quote(mut self, code: InstrumentCode, error: FeedError) -> Self {
        self.quotes.insert(code, Err(error));
        self
    }

    pub fn with_history(mut self, code: InstrumentCode, bars: Vec<DailyBar>) -> Self {
        self.histories.insert(code, bars);
        self
    }

    pub fn quote_calls(&self) -> usize {
        self.quote_calls.load(Ordering::SeqCst)
    }
}

impl MarketFeed for ScriptedFeed {
    fn quote<'a>(
        &'a self,
        code: &'a InstrumentCode,
    ) -> Pin<Box<dyn Future<Output = Result<QuotePayload, FeedError>> + Send + 'a>> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        let result = self
            .quotes
            .get(code)
            .cloned()
            .unwrap_or_else(|| Err(FeedError::instrument_not_found(code)));
        Box::pin(async move { result })
    }

    fn daily_history<'a>(
        &'a self,
        code: &'a InstrumentCode,
        _days: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DailyBar>, FeedError>> + Send + 'a>> {
        let result = self
            .histories
            .get(code)
            .cloned()
            .ok_or_else(|| FeedError::instrument_not_found(code));
        Box::pin(async move { result })
    }
}
