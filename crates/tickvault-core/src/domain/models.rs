use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{InstrumentCode, ValidationError};

time::serde::format_description!(pub iso_date, Date, "[year]-[month]-[day]");

/// Phase of the trading day at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    PreMarket,
    Open,
    PostMarket,
    Closed,
}

impl SessionState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreMarket => "pre_market",
            Self::Open => "open",
            Self::PostMarket => "post_market",
            Self::Closed => "closed",
        }
    }

    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar verdict for a single date.
///
/// `reason` carries the holiday name when the table overrides a weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingDay {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub is_trading_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Current market status answered by the service facade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingStatus {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub is_trading_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holiday: Option<String>,
    pub session: SessionState,
    #[serde(with = "iso_date")]
    pub previous_trading_day: Date,
}

/// Live quote fields as served by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotePayload {
    pub code: InstrumentCode,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub pre_close: f64,
    pub volume: f64,
    pub amount: f64,
    pub turnover_rate: f64,
}

impl QuotePayload {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: InstrumentCode,
        name: impl Into<String>,
        price: f64,
        change: f64,
        change_percent: f64,
        open: f64,
        high: f64,
        low: f64,
        pre_close: f64,
        volume: f64,
        amount: f64,
        turnover_rate: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("price", price)?;
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("pre_close", pre_close)?;
        validate_non_negative("volume", volume)?;
        validate_non_negative("amount", amount)?;
        validate_finite("change", change)?;
        validate_finite("change_percent", change_percent)?;
        validate_finite("turnover_rate", turnover_rate)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            code,
            name: name.into(),
            price,
            change,
            change_percent,
            open,
            high,
            low,
            pre_close,
            volume,
            amount,
            turnover_rate,
        })
    }
}

/// Captured quote for one instrument at one point in time.
///
/// The payload is opaque to the snapshot store; only `captured_at` orders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub code: InstrumentCode,
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
    pub payload: QuotePayload,
}

/// One daily kline row with the per-day indicator fields the upstream
/// provider packs alongside OHLCV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    pub amount: f64,
    pub amplitude: f64,
    pub change_percent: f64,
    pub turnover_rate: f64,
}

impl DailyBar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: Date,
        open: f64,
        close: f64,
        high: f64,
        low: f64,
        volume: f64,
        amount: f64,
        amplitude: f64,
        change_percent: f64,
        turnover_rate: f64,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("close", close)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("volume", volume)?;
        validate_non_negative("amount", amount)?;
        validate_finite("amplitude", amplitude)?;
        validate_finite("change_percent", change_percent)?;
        validate_finite("turnover_rate", turnover_rate)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        Ok(Self {
            date,
            open,
            close,
            high,
            low,
            volume,
            amount,
            amplitude,
            change_percent,
            turnover_rate,
        })
    }
}

fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    Ok(())
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    validate_finite(field, value)?;
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}
