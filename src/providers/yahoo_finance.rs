use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::price::{Quote, QuoteSource};

/// Quote source backed by Yahoo Finance's chart endpoint.
pub struct YahooQuoteSource {
    base_url: String,
    client: reqwest::Client,
}

impl YahooQuoteSource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("shadowfolio/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(YahooQuoteSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(alias = "regularMarketTime")]
    regular_market_time: Option<i64>,
    currency: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<QuoteIndicator>,
}

#[derive(Deserialize, Debug)]
struct QuoteIndicator {
    close: Option<Vec<Option<f64>>>,
}

fn to_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Latest non-null daily close with its trading date, if the chart has bars.
fn latest_close(item: &ChartItem) -> Option<(f64, Option<NaiveDate>)> {
    let closes = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref())?;
    let timestamps = item.timestamp.as_deref().unwrap_or_default();

    closes
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, close)| close.map(|c| (c, timestamps.get(i).copied().and_then(to_date))))
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    #[instrument(
        name = "YahooQuoteFetch",
        skip(self),
        fields(ticker = %ticker)
    )]
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=5d",
            self.base_url, ticker
        );
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for ticker: {} URL: {}", e, ticker, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for ticker: {}",
                response.status(),
                ticker
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", ticker, e))?;

        if let Some(error) = data.chart.error {
            return Err(anyhow!(
                "Yahoo error for {}: {}",
                ticker,
                error.description.unwrap_or_else(|| "unknown".to_string())
            ));
        }

        let item = data
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| anyhow!("No price data found for ticker: {}", ticker))?;

        let (price, as_of) = match latest_close(&item) {
            Some(close) => close,
            None => {
                let price = item
                    .meta
                    .regular_market_price
                    .ok_or_else(|| anyhow!("No closing price for ticker: {}", ticker))?;
                (price, item.meta.regular_market_time.and_then(to_date))
            }
        };
        debug!(price, ?as_of, "Received Yahoo quote");

        Ok(Quote {
            price,
            currency: item.meta.currency,
            as_of,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(ticker: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{ticker}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_latest_close_is_used() {
        // 2024-06-03 and 2024-06-04 00:00 UTC
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": 16.1, "currency": "USD" },
                    "timestamp": [1717372800, 1717459200],
                    "indicators": { "quote": [{ "close": [14.2, 15.0] }] }
                }],
                "error": null
            }
        }"#;
        let mock_server = create_mock_server("TSM", 200, mock_response).await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let quote = source.fetch_quote("TSM").await.unwrap();
        assert_eq!(quote.price, 15.0);
        assert_eq!(quote.currency.as_deref(), Some("USD"));
        assert_eq!(quote.as_of, NaiveDate::from_ymd_opt(2024, 6, 4));
    }

    #[tokio::test]
    async fn test_trailing_null_close_is_skipped() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": 321.0, "currency": "HKD" },
                    "timestamp": [1717372800, 1717459200],
                    "indicators": { "quote": [{ "close": [320.0, null] }] }
                }]
            }
        }"#;
        let mock_server = create_mock_server("0700.HK", 200, mock_response).await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let quote = source.fetch_quote("0700.HK").await.unwrap();
        assert_eq!(quote.price, 320.0);
        assert_eq!(quote.as_of, NaiveDate::from_ymd_opt(2024, 6, 3));
    }

    #[tokio::test]
    async fn test_meta_price_when_no_bars() {
        let mock_response = r#"{
            "chart": {
                "result": [{
                    "meta": { "regularMarketPrice": 150.65, "currency": "USD" }
                }]
            }
        }"#;
        let mock_server = create_mock_server("AAPL", 200, mock_response).await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let quote = source.fetch_quote("AAPL").await.unwrap();
        assert_eq!(quote.price, 150.65);
        assert!(quote.as_of.is_none());
    }

    #[tokio::test]
    async fn test_yahoo_error_payload() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let mock_server = create_mock_server("GONE", 404, mock_response).await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let err = source.fetch_quote("GONE").await.unwrap_err();
        assert!(err.to_string().contains("HTTP error"));
    }

    #[tokio::test]
    async fn test_error_payload_with_success_status() {
        let mock_response = r#"{
            "chart": {
                "result": null,
                "error": { "description": "No data found, symbol may be delisted" }
            }
        }"#;
        let mock_server = create_mock_server("GONE", 200, mock_response).await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let err = source.fetch_quote("GONE").await.unwrap_err();
        assert!(err.to_string().contains("may be delisted"));
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let mock_server = create_mock_server("NVDA", 200, "not json").await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let err = source.fetch_quote("NVDA").await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON response for NVDA"));
    }

    #[tokio::test]
    async fn test_empty_result() {
        let mock_server =
            create_mock_server("NVDA", 200, r#"{"chart": {"result": []}}"#).await;

        let source = YahooQuoteSource::new(&mock_server.uri()).unwrap();
        let err = source.fetch_quote("NVDA").await.unwrap_err();
        assert!(err.to_string().contains("No price data found"));
    }
}
