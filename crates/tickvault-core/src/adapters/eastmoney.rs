//! Eastmoney push2 adapter.
//!
//! Talks to the public push2 quote and kline endpoints in real mode, and
//! serves deterministic seeded data when constructed with a mock transport.
//! Quote prices arrive as scaled integers (value * 100) and kline rows as
//! comma-packed strings; both quirks are normalized here.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{DailyBar, InstrumentCode, QuotePayload};
use crate::feed::{FeedError, MarketFeed};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::ValidationError;

const QUOTE_URL: &str = "https://push2.eastmoney.com/api/qt/stock/get";
const KLINE_URL: &str = "https://push2his.eastmoney.com/api/qt/stock/kline/get";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const REFERER: &str = "https://quote.eastmoney.com/";

// Shanghai index codes that collide with Shenzhen equity prefixes.
const SH_INDICES: [&str; 6] = ["000001", "000300", "000016", "000688", "000905", "000852"];

/// Map an instrument code to the provider's `market.code` security id.
///
/// `1.` is Shanghai, `0.` Shenzhen, `116.` the HK connect, `113.`/`142.`
/// main futures contracts (symbol plus `0` selects the dominant contract).
fn secid(code: &InstrumentCode) -> String {
    let raw = code.as_str();

    if raw.chars().all(|ch| ch.is_ascii_alphabetic()) {
        let market = match raw {
            "sc" => "142",
            _ => "113",
        };
        return format!("{market}.{raw}0");
    }

    if raw.len() == 5 && raw.chars().all(|ch| ch.is_ascii_digit()) {
        return format!("116.{raw}");
    }

    if SH_INDICES.contains(&raw) {
        return format!("1.{raw}");
    }

    match raw.as_bytes().first() {
        Some(b'6') | Some(b'9') | Some(b'5') => format!("1.{raw}"),
        Some(b'1') if !raw.starts_with("159") && !raw.starts_with("150") => format!("1.{raw}"),
        _ => format!("0.{raw}"),
    }
}

/// Eastmoney adapter supporting both real API calls and mock mode.
#[derive(Clone)]
pub struct EastmoneyAdapter {
    http_client: Arc<dyn HttpClient>,
    breaker: Arc<CircuitBreaker>,
    use_real_api: bool,
}

impl Default for EastmoneyAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            breaker: Arc::new(CircuitBreaker::default()),
            use_real_api: false,
        }
    }
}

impl EastmoneyAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        let use_real_api = !http_client.is_mock();
        Self {
            http_client,
            breaker: Arc::new(CircuitBreaker::default()),
            use_real_api,
        }
    }

    async fn execute(&self, url: String) -> Result<String, FeedError> {
        if !self.breaker.allow_request() {
            return Err(FeedError::unavailable(
                "eastmoney circuit breaker is open; skipping upstream call",
            ));
        }

        let request = HttpRequest::get(url)
            .with_header("user-agent", USER_AGENT)
            .with_header("referer", REFERER);

        let response = self.http_client.execute(request).await.map_err(|error| {
            self.breaker.record_failure();
            if error.retryable() {
                FeedError::unavailable(format!("eastmoney transport error: {}", error.message()))
            } else {
                FeedError::internal(format!("eastmoney transport error: {}", error.message()))
            }
        })?;

        if !response.is_success() {
            self.breaker.record_failure();
            return Err(FeedError::unavailable(format!(
                "eastmoney upstream returned status {}",
                response.status
            )));
        }

        self.breaker.record_success();
        Ok(response.body)
    }
}

impl MarketFeed for EastmoneyAdapter {
    fn quote<'a>(
        &'a self,
        code: &'a InstrumentCode,
    ) -> Pin<Box<dyn Future<Output = Result<QuotePayload, FeedError>> + Send + 'a>> {
        Box::pin(async move {
            if self.use_real_api {
                self.fetch_real_quote(code).await
            } else {
                self.fetch_fake_quote(code).await
            }
        })
    }

    fn daily_history<'a>(
        &'a self,
        code: &'a InstrumentCode,
        days: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<DailyBar>, FeedError>> + Send + 'a>> {
        Box::pin(async move {
            if days == 0 {
                return Err(FeedError::invalid_request(
                    "daily history request must cover at least one day",
                ));
            }

            if self.use_real_api {
                self.fetch_real_history(code, days).await
            } else {
                self.fetch_fake_history(code, days).await
            }
        })
    }
}

// Real API paths.
impl EastmoneyAdapter {
    async fn fetch_real_quote(&self, code: &InstrumentCode) -> Result<QuotePayload, FeedError> {
        let url = format!(
            "{QUOTE_URL}?secid={}&ut=fa5fd1943c7b386f172d6893dbfba10b\
             &fields=f43,f44,f45,f46,f47,f48,f57,f58,f60,f168,f169,f170",
            urlencoding::encode(&secid(code)),
        );

        let body = self.execute(url).await?;
        parse_quote_response(code, &body)
    }

    async fn fetch_real_history(
        &self,
        code: &InstrumentCode,
        days: usize,
    ) -> Result<Vec<DailyBar>, FeedError> {
        // klt=101 selects daily bars, fqt=1 forward-adjusted prices. The
        // provider ignores small lmt values and returns full history; the
        // window is cut client-side.
        let url = format!(
            "{KLINE_URL}?secid={}&ut=fa5fd1943c7b386f172d6893dbfba10b\
             &fields1=f1,f2,f3,f4,f5,f6\
             &fields2=f51,f52,f53,f54,f55,f56,f57,f58,f59,f60,f61\
             &klt=101&fqt=1&beg=0&end=20500101&lmt={}",
            urlencoding::encode(&secid(code)),
            days.max(120),
        );

        let body = self.execute(url).await?;
        let mut bars = parse_kline_response(code, &body)?;
        if bars.len() > days {
            bars.drain(..bars.len() - days);
        }
        Ok(bars)
    }
}

// Deterministic fake data for tests and mock runs.
impl EastmoneyAdapter {
    async fn fetch_fake_quote(&self, code: &InstrumentCode) -> Result<QuotePayload, FeedError> {
        self.execute(String::from(QUOTE_URL)).await?;

        let seed = code_seed(code);
        let price = 10.0 + (seed % 3_000) as f64 / 10.0;
        let change = ((seed % 41) as f64 - 20.0) / 10.0;

        QuotePayload::new(
            code.clone(),
            format!("mock-{code}"),
            price,
            change,
            change / price * 100.0,
            price - change,
            price + 0.8,
            (price - 1.2).max(0.0),
            price - change,
            50_000.0 + (seed % 10_000) as f64,
            (50_000.0 + (seed % 10_000) as f64) * price,
            0.5 + (seed % 40) as f64 / 10.0,
        )
        .map_err(validation_to_error)
    }

    async fn fetch_fake_history(
        &self,
        code: &InstrumentCode,
        days: usize,
    ) -> Result<Vec<DailyBar>, FeedError> {
        self.execute(String::from(KLINE_URL)).await?;

        let seed = code_seed(code);
        let today = OffsetDateTime::now_utc().date();
        let mut bars = Vec::with_capacity(days);

        for index in 0..days {
            let date = today - Duration::days((days - index) as i64);
            let base = 20.0 + (seed % 200) as f64 / 10.0 + index as f64 * 0.3;
            let bar = DailyBar::new(
                date,
                base,
                base + 0.4,
                base + 0.9,
                base - 0.6,
                10_000.0 + (index as f64) * 50.0,
                (10_000.0 + (index as f64) * 50.0) * base,
                (1.5 / base) * 100.0,
                ((seed + index as u64) % 60) as f64 / 10.0 - 3.0,
                0.8 + ((seed + index as u64) % 25) as f64 / 10.0,
            )
            .map_err(validation_to_error)?;
            bars.push(bar);
        }

        Ok(bars)
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    rc: i64,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct KlineResponse {
    rc: i64,
    #[serde(default)]
    data: Option<KlineData>,
}

#[derive(Debug, Deserialize)]
struct KlineData {
    #[serde(default)]
    klines: Vec<String>,
}

fn parse_quote_response(code: &InstrumentCode, body: &str) -> Result<QuotePayload, FeedError> {
    let response: QuoteResponse = serde_json::from_str(body)
        .map_err(|error| FeedError::internal(format!("failed to parse quote response: {error}")))?;

    let Some(data) = response.data.filter(|_| response.rc == 0) else {
        return Err(FeedError::instrument_not_found(code));
    };

    // Prices and percentages come scaled by 100; volume and amount do not.
    let scaled = |field: &str| numeric_field(&data, field) / 100.0;

    QuotePayload::new(
        code.clone(),
        data.get("f58").and_then(|v| v.as_str()).unwrap_or_default(),
        scaled("f43"),
        scaled("f169"),
        scaled("f170"),
        scaled("f46"),
        scaled("f44"),
        scaled("f45"),
        scaled("f60"),
        numeric_field(&data, "f47"),
        numeric_field(&data, "f48"),
        scaled("f168"),
    )
    .map_err(validation_to_error)
}

fn parse_kline_response(code: &InstrumentCode, body: &str) -> Result<Vec<DailyBar>, FeedError> {
    let response: KlineResponse = serde_json::from_str(body)
        .map_err(|error| FeedError::internal(format!("failed to parse kline response: {error}")))?;

    let Some(data) = response.data.filter(|_| response.rc == 0) else {
        return Err(FeedError::instrument_not_found(code));
    };

    let format = format_description!("[year]-[month]-[day]");
    let mut bars = Vec::with_capacity(data.klines.len());

    // Row layout: date,open,close,high,low,volume,amount,amplitude,
    // change_percent,change_amount,turnover_rate
    for row in &data.klines {
        let parts: Vec<&str> = row.split(',').collect();
        if parts.len() < 11 {
            continue;
        }

        let Ok(date) = Date::parse(parts[0], &format) else {
            continue;
        };

        let value = |index: usize| parts[index].parse::<f64>().unwrap_or(0.0);
        if let Ok(bar) = DailyBar::new(
            date,
            value(1),
            value(2),
            value(3),
            value(4),
            value(5),
            value(6),
            value(7),
            value(8),
            value(10),
        ) {
            bars.push(bar);
        }
    }

    Ok(bars)
}

fn numeric_field(data: &serde_json::Value, field: &str) -> f64 {
    // Missing fields arrive as "-" or are absent entirely.
    match data.get(field) {
        Some(value) => value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0.0),
        None => 0.0,
    }
}

fn code_seed(code: &InstrumentCode) -> u64 {
    code.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}

fn validation_to_error(error: ValidationError) -> FeedError {
    FeedError::internal(error.to_string())
}
