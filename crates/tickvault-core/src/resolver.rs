//! Session-aware quote resolution.
//!
//! While the session is open, quotes come from the live feed and successful
//! fetches are written through to the snapshot store. Outside the session,
//! only the snapshot cache is consulted. Every answer carries its provenance
//! so callers can tell live data from a cached fallback.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::calendar::TradingCalendar;
use crate::domain::{InstrumentCode, QuotePayload, SessionState, Snapshot};
use crate::feed::{FeedError, MarketFeed};
use crate::snapshot::SnapshotStore;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a resolved quote came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum QuoteSource {
    Live,
    Cached {
        #[serde(with = "time::serde::rfc3339")]
        captured_at: OffsetDateTime,
    },
}

impl QuoteSource {
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// A quote plus its provenance and any degradation notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedQuote {
    pub payload: QuotePayload,
    pub source: QuoteSource,
    pub session: SessionState,
    pub warnings: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("no live or cached data available for '{code}'")]
    NoData { code: InstrumentCode },
}

/// Resolves quotes against the live feed and the snapshot cache, arbitrated
/// by the trading calendar.
#[derive(Clone)]
pub struct QuoteResolver {
    feed: Arc<dyn MarketFeed>,
    calendar: Arc<TradingCalendar>,
    store: SnapshotStore,
    fetch_timeout: Duration,
}

impl QuoteResolver {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        calendar: Arc<TradingCalendar>,
        store: SnapshotStore,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            feed,
            calendar,
            store,
            fetch_timeout,
        }
    }

    pub async fn resolve(&self, code: &InstrumentCode) -> Result<ResolvedQuote, ResolveError> {
        self.resolve_at(code, OffsetDateTime::now_utc()).await
    }

    /// Resolve a quote as of the given instant.
    ///
    /// Open session: live first, cache as fallback (the fallback is noted
    /// in `warnings`). Any other session phase: cache only. When nothing
    /// can be served this returns [`ResolveError::NoData`].
    pub async fn resolve_at(
        &self,
        code: &InstrumentCode,
        at: OffsetDateTime,
    ) -> Result<ResolvedQuote, ResolveError> {
        let session = self.calendar.session_state(at);

        if session.is_open() {
            match self.fetch_live(code, at).await {
                Ok(payload) => {
                    return Ok(ResolvedQuote {
                        payload,
                        source: QuoteSource::Live,
                        session,
                        warnings: Vec::new(),
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        code = %code,
                        %error,
                        "live fetch failed during open session; trying snapshot cache"
                    );
                    let warning = format!("live fetch failed: {error}; served cached snapshot");
                    if let Some(snapshot) = self.store.latest_before(code, at).await {
                        return Ok(cached_quote(snapshot, session, vec![warning]));
                    }
                }
            }
            return Err(ResolveError::NoData { code: code.clone() });
        }

        // Outside the open session the cache is the only admissible source;
        // serving a live value here would misreport provenance.
        match self.store.latest_before(code, at).await {
            Some(snapshot) => Ok(cached_quote(snapshot, session, Vec::new())),
            None => {
                tracing::warn!(
                    code = %code,
                    session = %session,
                    "no snapshot covers the requested instant"
                );
                Err(ResolveError::NoData { code: code.clone() })
            }
        }
    }

    /// Live fetch under the configured timeout; successes are written through
    /// to the snapshot store so later closed-session reads can serve them.
    async fn fetch_live(
        &self,
        code: &InstrumentCode,
        at: OffsetDateTime,
    ) -> Result<QuotePayload, FeedError> {
        let budget_ms = u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX);
        let payload = tokio::time::timeout(self.fetch_timeout, self.feed.quote(code))
            .await
            .map_err(|_| FeedError::timed_out(budget_ms))??;

        let snapshot = Snapshot {
            code: code.clone(),
            captured_at: at,
            payload: payload.clone(),
        };
        if let Err(error) = self.store.record(snapshot).await {
            tracing::warn!(code = %code, %error, "failed to persist write-through snapshot");
        }

        Ok(payload)
    }
}

fn cached_quote(snapshot: Snapshot, session: SessionState, warnings: Vec<String>) -> ResolvedQuote {
    ResolvedQuote {
        payload: snapshot.payload,
        source: QuoteSource::Cached {
            captured_at: snapshot.captured_at,
        },
        session,
        warnings,
    }
}
