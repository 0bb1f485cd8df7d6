//! Pairwise indicator correlation between two instruments.
//!
//! Daily history for both instruments is aligned by calendar date (inner
//! join), per-day indicator series are extracted, and a Pearson coefficient
//! is computed per requested indicator. Degenerate inputs (too few paired
//! days, zero variance) yield `None` rather than an error or a NaN.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::Date;

use crate::domain::{DailyBar, InstrumentCode};
use crate::feed::{FeedError, MarketFeed};

/// Widest supported comparison window, in calendar days of history.
pub const MAX_WINDOW_DAYS: usize = 500;
/// Fewest paired observations for which a coefficient is reported.
pub const MIN_PAIRED_SAMPLES: usize = 3;
/// Moving-average period used by [`Indicator::Ma5`].
const MA_PERIOD: usize = 5;

/// Per-day indicator a correlation can be computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    TurnoverRate,
    Amplitude,
    ChangePercent,
    Ma5,
}

impl Indicator {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnoverRate => "turnover_rate",
            Self::Amplitude => "amplitude",
            Self::ChangePercent => "change_percent",
            Self::Ma5 => "ma5",
        }
    }
}

impl FromStr for Indicator {
    type Err = CorrelationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "turnover_rate" => Ok(Self::TurnoverRate),
            "amplitude" => Ok(Self::Amplitude),
            "change_percent" => Ok(Self::ChangePercent),
            "ma5" => Ok(Self::Ma5),
            other => Err(CorrelationError::UnknownIndicator {
                name: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CorrelationError {
    #[error("unknown indicator '{name}'; expected one of turnover_rate, amplitude, change_percent, ma5")]
    UnknownIndicator { name: String },
    #[error("window of {days} days is outside 1..={max}", max = MAX_WINDOW_DAYS)]
    InvalidWindow { days: usize },
    #[error("at least one indicator must be requested")]
    EmptyIndicators,
    #[error(transparent)]
    Feed(#[from] FeedError),
}

/// Validated correlation request.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationRequest {
    pub code1: InstrumentCode,
    pub code2: InstrumentCode,
    pub days: usize,
    pub indicators: Vec<Indicator>,
}

impl CorrelationRequest {
    pub fn new(
        code1: InstrumentCode,
        code2: InstrumentCode,
        days: usize,
        indicators: Vec<Indicator>,
    ) -> Result<Self, CorrelationError> {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(CorrelationError::InvalidWindow { days });
        }
        if indicators.is_empty() {
            return Err(CorrelationError::EmptyIndicators);
        }

        Ok(Self {
            code1,
            code2,
            days,
            indicators,
        })
    }
}

/// One date both instruments traded on, with the indicator value of each.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedPoint {
    #[serde(with = "crate::domain::iso_date")]
    pub date: Date,
    pub value1: f64,
    pub value2: f64,
}

/// Coefficient for one indicator, `None` when the paired series is too short
/// or has no variance. The aligned triples ride along so callers can chart
/// the window without recomputing the join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorCorrelation {
    pub indicator: Indicator,
    pub coefficient: Option<f64>,
    pub sample_size: usize,
    pub points: Vec<AlignedPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    pub code1: InstrumentCode,
    pub code2: InstrumentCode,
    pub days_requested: usize,
    pub paired_days: usize,
    pub correlations: Vec<IndicatorCorrelation>,
}

/// Computes indicator correlations from upstream daily history.
#[derive(Clone)]
pub struct CorrelationEngine {
    feed: Arc<dyn MarketFeed>,
}

impl CorrelationEngine {
    pub fn new(feed: Arc<dyn MarketFeed>) -> Self {
        Self { feed }
    }

    pub async fn compute(
        &self,
        request: &CorrelationRequest,
    ) -> Result<CorrelationResult, CorrelationError> {
        // The MA5 window eats its first four days, so fetch enough history
        // that the requested window survives the warm-up.
        let fetch_days = request.days + MA_PERIOD - 1;
        let bars1 = self.feed.daily_history(&request.code1, fetch_days).await?;
        let bars2 = self.feed.daily_history(&request.code2, fetch_days).await?;

        let mut correlations = Vec::with_capacity(request.indicators.len());
        let mut paired_days = 0;

        for &indicator in &request.indicators {
            let series1 = indicator_series(&bars1, indicator);
            let series2 = indicator_series(&bars2, indicator);
            let aligned = align(&series1, &series2, request.days);

            paired_days = paired_days.max(aligned.len());
            let coefficient = if aligned.len() < MIN_PAIRED_SAMPLES {
                tracing::debug!(
                    indicator = %indicator,
                    paired = aligned.len(),
                    "too few paired days for a coefficient"
                );
                None
            } else {
                pearson(&aligned)
            };

            correlations.push(IndicatorCorrelation {
                indicator,
                coefficient,
                sample_size: aligned.len(),
                points: aligned,
            });
        }

        Ok(CorrelationResult {
            code1: request.code1.clone(),
            code2: request.code2.clone(),
            days_requested: request.days,
            paired_days,
            correlations,
        })
    }
}

/// Extract the per-date series for one indicator, oldest first.
fn indicator_series(bars: &[DailyBar], indicator: Indicator) -> Vec<(Date, f64)> {
    match indicator {
        Indicator::TurnoverRate => bars.iter().map(|b| (b.date, b.turnover_rate)).collect(),
        Indicator::Amplitude => bars.iter().map(|b| (b.date, b.amplitude)).collect(),
        Indicator::ChangePercent => bars.iter().map(|b| (b.date, b.change_percent)).collect(),
        Indicator::Ma5 => moving_average(bars, MA_PERIOD),
    }
}

/// Trailing moving average of closes; the first `period - 1` days have no
/// value and are dropped.
fn moving_average(bars: &[DailyBar], period: usize) -> Vec<(Date, f64)> {
    if bars.len() < period {
        return Vec::new();
    }

    bars.windows(period)
        .map(|window| {
            let sum: f64 = window.iter().map(|bar| bar.close).sum();
            (window[period - 1].date, sum / period as f64)
        })
        .collect()
}

/// Inner-join two date series and keep the most recent `limit` pairs.
fn align(series1: &[(Date, f64)], series2: &[(Date, f64)], limit: usize) -> Vec<AlignedPoint> {
    let by_date: BTreeMap<Date, f64> = series2.iter().copied().collect();

    let mut aligned: Vec<AlignedPoint> = series1
        .iter()
        .filter_map(|&(date, value1)| {
            by_date.get(&date).map(|&value2| AlignedPoint {
                date,
                value1,
                value2,
            })
        })
        .collect();

    if aligned.len() > limit {
        aligned.drain(..aligned.len() - limit);
    }
    aligned
}

/// Pearson coefficient over aligned pairs; `None` when either side has zero
/// variance, where the coefficient is undefined.
fn pearson(points: &[AlignedPoint]) -> Option<f64> {
    let n = points.len() as f64;
    let mean1 = points.iter().map(|p| p.value1).sum::<f64>() / n;
    let mean2 = points.iter().map(|p| p.value2).sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance1 = 0.0;
    let mut variance2 = 0.0;
    for point in points {
        let d1 = point.value1 - mean1;
        let d2 = point.value2 - mean2;
        covariance += d1 * d2;
        variance1 += d1 * d1;
        variance2 += d2 * d2;
    }

    if variance1 <= 0.0 || variance2 <= 0.0 {
        return None;
    }

    Some(covariance / (variance1 * variance2).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::QuotePayload;
    use crate::feed::FeedError;
    use std::future::Future;
    use std::pin::Pin;
    use time::macros::date;

    fn code(raw: &str) -> InstrumentCode {
        InstrumentCode::parse(raw).expect("valid code")
    }

    fn bar(date: Date, close: f64, turnover: f64, change: f64) -> DailyBar {
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

    struct HistoryFeed {
        histories: BTreeMap<InstrumentCode, Vec<DailyBar>>,
    }

    impl MarketFeed for HistoryFeed {
        fn quote<'a>(
            &'a self,
            code: &'a InstrumentCode,
        ) -> Pin<Box<dyn Future<Output = Result<QuotePayload, FeedError>> + Send + 'a>> {
            Box::pin(async move { Err(FeedError::instrument_not_found(code)) })
        }

        fn daily_history<'a>(
            &'a self,
            code: &'a InstrumentCode,
            _days: usize,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<DailyBar>, FeedError>> + Send + 'a>> {
            let bars = self.histories.get(code).cloned();
            Box::pin(async move { bars.ok_or_else(|| FeedError::instrument_not_found(code)) })
        }
    }

    fn engine(histories: BTreeMap<InstrumentCode, Vec<DailyBar>>) -> CorrelationEngine {
        CorrelationEngine::new(Arc::new(HistoryFeed { histories }))
    }

    fn request(days: usize, indicators: Vec<Indicator>) -> CorrelationRequest {
        CorrelationRequest::new(code("600519"), code("000858"), days, indicators)
            .expect("valid request")
    }

    #[test]
    fn indicator_parses_known_names_case_insensitively() {
        assert_eq!(
            "Turnover_Rate".parse::<Indicator>().expect("parses"),
            Indicator::TurnoverRate
        );
        assert!(matches!(
            "volatility".parse::<Indicator>(),
            Err(CorrelationError::UnknownIndicator { .. })
        ));
    }

    #[test]
    fn request_rejects_bad_window_and_empty_indicators() {
        let err = CorrelationRequest::new(code("a"), code("b"), 0, vec![Indicator::Ma5])
            .expect_err("zero window");
        assert_eq!(err, CorrelationError::InvalidWindow { days: 0 });

        let err =
            CorrelationRequest::new(code("a"), code("b"), MAX_WINDOW_DAYS + 1, vec![Indicator::Ma5])
                .expect_err("oversized window");
        assert!(matches!(err, CorrelationError::InvalidWindow { .. }));

        let err = CorrelationRequest::new(code("a"), code("b"), 30, Vec::new())
            .expect_err("no indicators");
        assert_eq!(err, CorrelationError::EmptyIndicators);
    }

    #[test]
    fn align_keeps_only_shared_dates() {
        let series1 = vec![
            (date!(2026 - 03 - 02), 1.0),
            (date!(2026 - 03 - 03), 2.0),
            (date!(2026 - 03 - 04), 3.0),
        ];
        let series2 = vec![
            (date!(2026 - 03 - 03), 20.0),
            (date!(2026 - 03 - 04), 30.0),
            (date!(2026 - 03 - 05), 40.0),
        ];

        let aligned = align(&series1, &series2, 100);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned[0].date, date!(2026 - 03 - 03));
        assert_eq!(aligned[0].value2, 20.0);
    }

    #[test]
    fn pearson_is_one_for_a_perfect_linear_relation() {
        let points: Vec<AlignedPoint> = (0..5)
            .map(|i| AlignedPoint {
                date: date!(2026 - 03 - 02) + time::Duration::days(i),
                value1: i as f64,
                value2: 2.0 * i as f64 + 1.0,
            })
            .collect();

        let coefficient = pearson(&points).expect("defined coefficient");
        assert!((coefficient - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_none_for_a_constant_series() {
        let points: Vec<AlignedPoint> = (0..5)
            .map(|i| AlignedPoint {
                date: date!(2026 - 03 - 02) + time::Duration::days(i),
                value1: 7.0,
                value2: i as f64,
            })
            .collect();

        assert_eq!(pearson(&points), None);
    }

    #[tokio::test]
    async fn computes_turnover_correlation_over_shared_dates() {
        let base = date!(2026 - 03 - 02);
        let bars1: Vec<DailyBar> = (0..10)
            .map(|i| bar(base + time::Duration::days(i), 10.0, 1.0 + i as f64, 0.5))
            .collect();
        // Shifted by two days so only eight dates overlap; turnover moves
        // opposite to the first instrument's.
        let bars2: Vec<DailyBar> = (0..10)
            .map(|i| {
                bar(
                    base + time::Duration::days(i + 2),
                    20.0,
                    10.0 - i as f64,
                    -0.5,
                )
            })
            .collect();

        let mut histories = BTreeMap::new();
        histories.insert(code("600519"), bars1);
        histories.insert(code("000858"), bars2);

        let result = engine(histories)
            .compute(&request(30, vec![Indicator::TurnoverRate]))
            .await
            .expect("correlation");

        assert_eq!(result.paired_days, 8);
        let turnover = &result.correlations[0];
        assert_eq!(turnover.sample_size, 8);
        let coefficient = turnover.coefficient.expect("defined coefficient");
        assert!((coefficient + 1.0).abs() < 1e-12, "got {coefficient}");
    }

    #[tokio::test]
    async fn ma5_needs_enough_history_to_warm_up() {
        let base = date!(2026 - 03 - 02);
        let bars: Vec<DailyBar> = (0..4)
            .map(|i| bar(base + time::Duration::days(i), 10.0 + i as f64, 1.0, 0.5))
            .collect();

        let mut histories = BTreeMap::new();
        histories.insert(code("600519"), bars.clone());
        histories.insert(code("000858"), bars);

        let result = engine(histories)
            .compute(&request(30, vec![Indicator::Ma5]))
            .await
            .expect("correlation");

        assert_eq!(result.correlations[0].sample_size, 0);
        assert_eq!(result.correlations[0].coefficient, None);
    }

    #[tokio::test]
    async fn too_few_paired_days_reports_none() {
        let base = date!(2026 - 03 - 02);
        let bars1 = vec![
            bar(base, 10.0, 1.0, 0.5),
            bar(base + time::Duration::days(1), 11.0, 2.0, 0.6),
        ];
        let bars2 = vec![
            bar(base, 20.0, 3.0, 0.1),
            bar(base + time::Duration::days(1), 21.0, 4.0, 0.2),
        ];

        let mut histories = BTreeMap::new();
        histories.insert(code("600519"), bars1);
        histories.insert(code("000858"), bars2);

        let result = engine(histories)
            .compute(&request(30, vec![Indicator::ChangePercent]))
            .await
            .expect("correlation");

        assert_eq!(result.correlations[0].sample_size, 2);
        assert_eq!(result.correlations[0].coefficient, None);
    }

    #[tokio::test]
    async fn unknown_instrument_surfaces_the_feed_error() {
        let result = engine(BTreeMap::new())
            .compute(&request(30, vec![Indicator::Amplitude]))
            .await;
        assert!(matches!(result, Err(CorrelationError::Feed(_))));
    }
}
