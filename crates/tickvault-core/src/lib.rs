//! # Tickvault Core
//!
//! Session-aware market data caching for A-share instruments.
//!
//! ## Overview
//!
//! This crate provides the foundational components for Tickvault:
//!
//! - **Trading calendar** with a holiday table, session windows, and
//!   prior-trading-day walks
//! - **Durable snapshot store** holding a bounded, time-ordered quote log
//!   per instrument
//! - **Quote resolver** that serves live data while the session is open and
//!   cached snapshots while it is not, with provenance on every answer
//! - **Correlation engine** computing Pearson coefficients over date-aligned
//!   daily indicators
//! - **Market feed trait** with an Eastmoney adapter and a circuit breaker
//!   for resilient upstream calls
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Eastmoney) |
//! | [`calendar`] | Trading calendar and session windows |
//! | [`circuit_breaker`] | Circuit breaker for resilient calls |
//! | [`config`] | Runtime configuration |
//! | [`correlation`] | Indicator correlation engine |
//! | [`domain`] | Domain models (InstrumentCode, QuotePayload, Snapshot) |
//! | [`error`] | Core error types |
//! | [`feed`] | Market feed trait and feed errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`resolver`] | Session-aware quote resolution |
//! | [`service`] | Facade wiring the components together |
//! | [`snapshot`] | Durable snapshot store |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickvault_core::{EastmoneyAdapter, InstrumentCode, MarketService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = MarketService::in_memory(Arc::new(EastmoneyAdapter::default()));
//!
//!     let code = InstrumentCode::parse("600519")?;
//!     let resolved = service.resolve_quote(&code).await?;
//!     println!("{} = {:.2} ({:?})", code, resolved.payload.price, resolved.source);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result` types with structured errors: validation
//! failures surface as [`ValidationError`], feed problems as
//! [`FeedError`](feed::FeedError) with a kind and a retryable flag, and a
//! quote with neither a live nor a cached source as
//! [`ResolveError::NoData`](resolver::ResolveError).

pub mod adapters;
pub mod calendar;
pub mod circuit_breaker;
pub mod config;
pub mod correlation;
pub mod domain;
pub mod error;
pub mod feed;
pub mod http_client;
pub mod resolver;
pub mod service;
pub mod snapshot;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::EastmoneyAdapter;

// Calendar
pub use calendar::{CalendarError, SessionWindows, TradingCalendar};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::CoreConfig;

// Correlation engine
pub use correlation::{
    AlignedPoint, CorrelationEngine, CorrelationError, CorrelationRequest, CorrelationResult,
    Indicator, IndicatorCorrelation, MAX_WINDOW_DAYS,
};

// Domain models
pub use domain::{
    DailyBar, InstrumentCode, QuotePayload, SessionState, Snapshot, TradingDay, TradingStatus,
};

// Error types
pub use error::{StoreError, ValidationError};

// Feed trait and errors
pub use feed::{FeedError, FeedErrorKind, MarketFeed};

// HTTP client types
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Resolver
pub use resolver::{QuoteResolver, QuoteSource, ResolveError, ResolvedQuote};

// Service facade
pub use service::{CaptureFailure, CaptureReport, MarketService};

// Snapshot store
pub use snapshot::{SnapshotStore, DEFAULT_RETENTION};
