//! Canonical domain types shared by the calendar, cache, and engines.

mod code;
mod models;

pub use code::InstrumentCode;
pub use models::{
    iso_date, DailyBar, QuotePayload, SessionState, Snapshot, TradingDay, TradingStatus,
};
