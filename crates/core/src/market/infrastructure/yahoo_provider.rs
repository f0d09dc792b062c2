use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::market::domain::market_data_provider::{DailyBar, MarketDataProvider};
use crate::shared::constants::{HTTP_USER_AGENT, YAHOO_CHART_URL};
use crate::shared::retry::ProviderError;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Meta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Daily price history from the Yahoo Finance chart API.
pub struct YahooFinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooFinanceProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(HTTP_USER_AGENT)
            .build()
            .map_err(|e| ProviderError::from_reqwest(YAHOO_CHART_URL, e))?;
        Ok(Self {
            client,
            base_url: YAHOO_CHART_URL.to_string(),
        })
    }
}

impl MarketDataProvider for YahooFinanceProvider {
    fn daily_bars(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyBar>, ProviderError> {
        let url = format!("{}/{symbol}", self.base_url);
        let period1 = from.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = to.and_time(NaiveTime::MIN).and_utc().timestamp();
        log::debug!("Fetching {symbol} bars {from}..{to}");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .map_err(|e| ProviderError::from_reqwest(&url, e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited { endpoint: url });
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                endpoint: url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|e| ProviderError::from_reqwest(&url, e))?;
        parse_bars(&body).map_err(|detail| ProviderError::Malformed {
            endpoint: url,
            detail,
        })
    }
}

/// Bars with any missing field are skipped. Timestamps are shifted by the
/// exchange's GMT offset before taking the calendar date.
fn parse_bars(body: &str) -> Result<Vec<DailyBar>, String> {
    let response: ChartResponse = serde_json::from_str(body).map_err(|e| e.to_string())?;
    if let Some(error) = response.chart.error {
        return Err(format!("{}: {}", error.code, error.description));
    }
    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(low), Some(high), Some(close)) =
            (field(&quote.low), field(&quote.high), field(&quote.close))
        else {
            continue;
        };
        let Some(time) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            continue;
        };
        bars.push(DailyBar {
            date: time.date_naive(),
            low,
            high,
            close,
        });
    }
    Ok(bars)
}
