//! Market feed collaborator contract.
//!
//! The resolver and the correlation engine consume upstream data through
//! this trait; adapters implement it against a concrete provider.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::domain::{DailyBar, InstrumentCode, QuotePayload};

/// Feed-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedErrorKind {
    /// Transient upstream or transport failure, including timeouts.
    Unavailable,
    /// The provider does not know the instrument code.
    InstrumentNotFound,
    InvalidRequest,
    Internal,
}

/// Structured feed error carried across the collaborator boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedError {
    kind: FeedErrorKind,
    message: String,
    retryable: bool,
}

impl FeedError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn timed_out(timeout_ms: u64) -> Self {
        Self::unavailable(format!("live fetch exceeded {timeout_ms}ms budget"))
    }

    pub fn instrument_not_found(code: &InstrumentCode) -> Self {
        Self {
            kind: FeedErrorKind::InstrumentNotFound,
            message: format!("instrument '{code}' is not known to the provider"),
            retryable: false,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: FeedErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FeedErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FeedErrorKind::Unavailable => "feed.unavailable",
            FeedErrorKind::InstrumentNotFound => "feed.instrument_not_found",
            FeedErrorKind::InvalidRequest => "feed.invalid_request",
            FeedErrorKind::Internal => "feed.internal",
        }
    }
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FeedError {}

/// Upstream market data contract.
///
/// Implementations must be `Send + Sync`; the resolver shares them across
/// request handlers and the capture task.
pub trait MarketFeed: Send + Sync {
    /// Fetch the current quote for one instrument.
    fn quote<'a>(
        &'a self,
        code: &'a InstrumentCode,
    ) -> Pin<Box<dyn Future<Output = Result<QuotePayload, FeedError>> + Send + 'a>>;

    /// Fetch up to `days` daily bars, oldest first.
    ///
    /// Providers with shorter history return fewer rows; callers must not
    /// assume the exact length.
    fn daily_history<'a>(
        &'a self,
        code: &'a InstrumentCode,
        days: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DailyBar>, FeedError>> + Send + 'a>>;
}
