//! Behavior-driven tests for the indicator correlation engine.
//!
//! These tests verify HOW two instruments' daily histories are aligned on
//! shared dates and how degenerate series degrade to null coefficients.

use tickvault_core::{
    CorrelationEngine, CorrelationError, CorrelationRequest, Indicator, MAX_WINDOW_DAYS,
};
use tickvault_tests::{bar, code, Arc, ScriptedFeed};
use time::macros::date;
use time::{Date, Duration};

const BASE: Date = date!(2026 - 03 - 02);

fn day(offset: i64) -> Date {
    BASE + Duration::days(offset)
}

fn engine(feed: ScriptedFeed) -> CorrelationEngine {
    CorrelationEngine::new(Arc::new(feed))
}

fn request(days: usize, indicators: Vec<Indicator>) -> CorrelationRequest {
    CorrelationRequest::new(code("600519"), code("000858"), days, indicators)
        .expect("valid request")
}

// =============================================================================
// Correlation: Date Alignment
// =============================================================================

#[tokio::test]
async fn when_histories_only_partially_overlap_only_shared_dates_count() {
    // Given: Ten days of history each, shifted by three days
    let bars1 = (0..10).map(|i| bar(day(i), 10.0, 1.0 + i as f64, 0.5)).collect();
    let bars2 = (0..10)
        .map(|i| bar(day(i + 3), 20.0, 2.0 * (1.0 + i as f64), -0.5))
        .collect();
    let feed = ScriptedFeed::new()
        .with_history(code("600519"), bars1)
        .with_history(code("000858"), bars2);

    // When: Turnover correlation is requested
    let result = engine(feed)
        .compute(&request(30, vec![Indicator::TurnoverRate]))
        .await
        .expect("correlation");

    // Then: Exactly the seven shared dates are paired
    assert_eq!(result.paired_days, 7);
    assert_eq!(result.correlations[0].sample_size, 7);

    // And the aligned triples cover exactly the overlap, in date order
    let points = &result.correlations[0].points;
    assert_eq!(points.first().map(|p| p.date), Some(day(3)));
    assert_eq!(points.last().map(|p| p.date), Some(day(9)));
    assert!(points.windows(2).all(|pair| pair[0].date < pair[1].date));

    // And both turnover series rise together, so the correlation is perfect
    let coefficient = result.correlations[0].coefficient.expect("defined");
    assert!((coefficient - 1.0).abs() < 1e-9, "got {coefficient}");
}

#[tokio::test]
async fn when_one_indicator_moves_against_the_other_the_sign_is_negative() {
    let bars1 = (0..10).map(|i| bar(day(i), 10.0, 1.0, i as f64)).collect();
    let bars2 = (0..10)
        .map(|i| bar(day(i), 20.0, 1.0, 9.0 - i as f64))
        .collect();
    let feed = ScriptedFeed::new()
        .with_history(code("600519"), bars1)
        .with_history(code("000858"), bars2);

    let result = engine(feed)
        .compute(&request(30, vec![Indicator::ChangePercent]))
        .await
        .expect("correlation");

    let coefficient = result.correlations[0].coefficient.expect("defined");
    assert!((coefficient + 1.0).abs() < 1e-9, "got {coefficient}");
}

#[tokio::test]
async fn when_multiple_indicators_are_requested_each_gets_its_own_coefficient() {
    let bars1 = (0..10)
        .map(|i| bar(day(i), 10.0 + i as f64, 1.0 + i as f64, 0.5))
        .collect();
    let bars2 = (0..10)
        .map(|i| bar(day(i), 30.0 - i as f64, 5.0, 0.5))
        .collect();
    let feed = ScriptedFeed::new()
        .with_history(code("600519"), bars1)
        .with_history(code("000858"), bars2);

    let result = engine(feed)
        .compute(&request(
            30,
            vec![Indicator::TurnoverRate, Indicator::Ma5],
        ))
        .await
        .expect("correlation");

    assert_eq!(result.correlations.len(), 2);

    // Turnover: rising vs constant, so no defined coefficient
    assert_eq!(result.correlations[0].indicator, Indicator::TurnoverRate);
    assert_eq!(result.correlations[0].coefficient, None);

    // MA5: closes move in strict opposition
    assert_eq!(result.correlations[1].indicator, Indicator::Ma5);
    let ma5 = result.correlations[1].coefficient.expect("defined");
    assert!((ma5 + 1.0).abs() < 1e-9, "got {ma5}");
}

// =============================================================================
// Correlation: Degenerate Inputs
// =============================================================================

#[tokio::test]
async fn when_fewer_than_three_days_overlap_the_coefficient_is_null() {
    let bars1 = vec![bar(day(0), 10.0, 1.0, 0.5), bar(day(1), 11.0, 2.0, 0.6)];
    let bars2 = vec![bar(day(0), 20.0, 3.0, 0.1), bar(day(1), 21.0, 4.0, 0.2)];
    let feed = ScriptedFeed::new()
        .with_history(code("600519"), bars1)
        .with_history(code("000858"), bars2);

    let result = engine(feed)
        .compute(&request(30, vec![Indicator::Amplitude]))
        .await
        .expect("correlation");

    assert_eq!(result.correlations[0].sample_size, 2);
    assert_eq!(result.correlations[0].coefficient, None);
}

#[tokio::test]
async fn when_a_series_is_constant_the_coefficient_is_null_not_nan() {
    let bars1 = (0..10).map(|i| bar(day(i), 10.0, 7.0, 0.5)).collect();
    let bars2 = (0..10)
        .map(|i| bar(day(i), 20.0, 1.0 + i as f64, 0.5))
        .collect();
    let feed = ScriptedFeed::new()
        .with_history(code("600519"), bars1)
        .with_history(code("000858"), bars2);

    let result = engine(feed)
        .compute(&request(30, vec![Indicator::TurnoverRate]))
        .await
        .expect("correlation");

    assert_eq!(result.correlations[0].coefficient, None);
    assert_eq!(result.correlations[0].sample_size, 10);
}

// =============================================================================
// Correlation: Request Validation and Feed Errors
// =============================================================================

#[tokio::test]
async fn when_the_request_is_malformed_it_is_rejected_before_any_fetch() {
    let zero = CorrelationRequest::new(code("a"), code("b"), 0, vec![Indicator::Ma5]);
    assert!(matches!(zero, Err(CorrelationError::InvalidWindow { days: 0 })));

    let oversized = CorrelationRequest::new(
        code("a"),
        code("b"),
        MAX_WINDOW_DAYS + 1,
        vec![Indicator::Ma5],
    );
    assert!(matches!(oversized, Err(CorrelationError::InvalidWindow { .. })));

    let empty = CorrelationRequest::new(code("a"), code("b"), 30, Vec::new());
    assert!(matches!(empty, Err(CorrelationError::EmptyIndicators)));

    let unknown = "beta".parse::<Indicator>();
    assert!(matches!(
        unknown,
        Err(CorrelationError::UnknownIndicator { .. })
    ));
}

#[tokio::test]
async fn when_one_instrument_is_unknown_the_feed_error_passes_through() {
    let bars1 = (0..10).map(|i| bar(day(i), 10.0, 1.0, 0.5)).collect();
    let feed = ScriptedFeed::new().with_history(code("600519"), bars1);

    let result = engine(feed)
        .compute(&request(30, vec![Indicator::Amplitude]))
        .await;

    assert!(matches!(result, Err(CorrelationError::Feed(_))));
}
