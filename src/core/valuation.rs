//! Valuation of the portfolio in the reporting currency.
//!
//! Every holding gets exactly one current price per run. The price is taken
//! from the first rule that applies:
//!
//! 1. a pinned override from configuration, used as-is;
//! 2. a usable live quote, normalized to the reporting currency;
//! 3. the holding's own buy price, i.e. no gain or loss.
//!
//! A failed quote only ever affects its own holding.
use crate::core::config::AppConfig;
use crate::core::currency::CurrencyNormalizer;
use crate::core::price::{Quote, QuoteSource};
use crate::core::tables::Holding;
use anyhow::{Result, anyhow};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where a holding's current price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Pinned,
    Live,
    CostBasis,
}

/// Rules that turn a quote into a reporting-currency price.
#[derive(Debug, Clone)]
pub struct PricingRules {
    pub normalizer: CurrencyNormalizer,
    pub pinned_prices: HashMap<String, f64>,
}

impl PricingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        PricingRules {
            normalizer: CurrencyNormalizer::from_config(config),
            pinned_prices: config.pinned_prices.clone(),
        }
    }

    pub fn is_pinned(&self, ticker: &str) -> bool {
        self.pinned_prices.contains_key(ticker)
    }

    /// Resolves the current reporting-currency price of a holding.
    pub fn resolve_price(
        &self,
        holding: &Holding,
        quote: Option<&Result<Quote>>,
    ) -> (f64, PriceSource) {
        if let Some(pinned) = self.pinned_prices.get(&holding.ticker) {
            debug!("Using pinned price {pinned} for {}", holding.ticker);
            return (*pinned, PriceSource::Pinned);
        }

        match quote {
            Some(Ok(q)) if q.is_usable() => (
                self.normalizer.normalize(&holding.ticker, q.price),
                PriceSource::Live,
            ),
            Some(Ok(q)) => {
                debug!(
                    "Unusable price {} for {}, falling back to cost basis",
                    q.price, holding.ticker
                );
                (holding.buy_price, PriceSource::CostBasis)
            }
            Some(Err(e)) => {
                debug!(
                    "Quote failed for {}: {e}, falling back to cost basis",
                    holding.ticker
                );
                (holding.buy_price, PriceSource::CostBasis)
            }
            None => {
                debug!("No quote for {}, falling back to cost basis", holding.ticker);
                (holding.buy_price, PriceSource::CostBasis)
            }
        }
    }
}

/// Bounds for the quote fan-out.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl FetchOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        FetchOptions {
            concurrency: config.providers.yahoo.concurrency,
            timeout: Duration::from_secs(config.providers.yahoo.timeout_secs),
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            concurrency: 4,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Valued view of a single holding.
#[derive(Debug, Clone)]
pub struct HoldingValue {
    pub holding: Holding,
    pub current_price: f64,
    pub current_value: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
    pub price_source: PriceSource,
}

impl HoldingValue {
    pub fn new(holding: &Holding, current_price: f64, price_source: PriceSource) -> Self {
        let current_value = current_price * holding.units;
        let gain_loss = current_value - holding.investment;
        HoldingValue {
            holding: holding.clone(),
            current_price,
            current_value,
            gain_loss,
            gain_loss_pct: percentage(gain_loss, holding.investment),
            price_source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioTotals {
    pub invested: f64,
    pub current_value: f64,
    pub gain_loss: f64,
    pub gain_loss_pct: f64,
}

#[derive(Debug, Clone)]
pub struct PortfolioValuation {
    pub holdings: Vec<HoldingValue>,
    pub totals: PortfolioTotals,
}

impl PortfolioValuation {
    pub fn fallback_count(&self) -> usize {
        self.holdings
            .iter()
            .filter(|h| h.price_source == PriceSource::CostBasis)
            .count()
    }
}

/// `part / whole * 100`, with zero when there is nothing to divide by.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Values holdings against already fetched quotes, keyed by ticker. Pure.
pub fn value_portfolio(
    holdings: &[Holding],
    quotes: &HashMap<String, Result<Quote>>,
    rules: &PricingRules,
) -> PortfolioValuation {
    let mut valued = Vec::with_capacity(holdings.len());
    let mut totals = PortfolioTotals::default();

    for holding in holdings {
        let (price, source) = rules.resolve_price(holding, quotes.get(&holding.ticker));
        let value = HoldingValue::new(holding, price, source);
        totals.invested += holding.investment;
        totals.current_value += value.current_value;
        valued.push(value);
    }

    totals.gain_loss = totals.current_value - totals.invested;
    totals.gain_loss_pct = percentage(totals.gain_loss, totals.invested);

    PortfolioValuation {
        holdings: valued,
        totals,
    }
}

/// Fetches quotes for every distinct, non-pinned ticker with at most
/// `options.concurrency` requests in flight. A request that fails or exceeds
/// `options.timeout` is recorded as an error for that ticker only.
pub async fn fetch_quotes(
    holdings: &[Holding],
    source: &(dyn QuoteSource + Send + Sync),
    rules: &PricingRules,
    options: &FetchOptions,
    update_callback: &(dyn Fn() + Sync),
) -> HashMap<String, Result<Quote>> {
    let mut seen = HashSet::new();
    let tickers: Vec<&str> = holdings
        .iter()
        .map(|h| h.ticker.as_str())
        .filter(|t| !rules.is_pinned(t) && seen.insert(*t))
        .collect();
    debug!("Fetching {} quotes", tickers.len());

    let timeout = options.timeout;
    stream::iter(tickers)
        .map(|ticker| async move {
            let result = match tokio::time::timeout(timeout, source.fetch_quote(ticker)).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "Quote request for {ticker} timed out after {}s",
                    timeout.as_secs_f64()
                )),
            };
            if let Err(e) = &result {
                warn!("Quote unavailable for {ticker}: {e}");
            }
            update_callback();
            (ticker.to_string(), result)
        })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await
}

/// Runs one full valuation pass: quote fan-out followed by pricing.
pub async fn valuate(
    holdings: &[Holding],
    source: &(dyn QuoteSource + Send + Sync),
    rules: &PricingRules,
    options: &FetchOptions,
    update_callback: &(dyn Fn() + Sync),
) -> PortfolioValuation {
    let quotes = fetch_quotes(holdings, source, rules, options, update_callback).await;
    let valuation = value_portfolio(holdings, &quotes, rules);
    info!(
        "Valued {} holdings ({} at cost basis)",
        valuation.holdings.len(),
        valuation.fallback_count()
    );
    valuation
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn holding(ticker: &str, units: f64, buy_price: f64, investment: f64) -> Holding {
        Holding {
            stock: ticker.to_string(),
            ticker: ticker.to_string(),
            units,
            buy_price,
            investment,
            barbell_type: "Core".to_string(),
        }
    }

    fn rules() -> PricingRules {
        PricingRules {
            normalizer: CurrencyNormalizer::new(
                83.5,
                vec![".HK".to_string(), ".SZ".to_string(), ".SS".to_string()],
            ),
            pinned_prices: HashMap::from([("PLTR".to_string(), 1670.0)]),
        }
    }

    // MockQuoteSource for QuoteSource
    struct MockQuoteSource {
        prices: HashMap<String, f64>,
        delays: HashMap<String, Duration>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockQuoteSource {
        fn new() -> Self {
            MockQuoteSource {
                prices: HashMap::new(),
                delays: HashMap::new(),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        fn with_price(mut self, ticker: &str, price: f64) -> Self {
            self.prices.insert(ticker.to_string(), price);
            self
        }

        fn with_delay(mut self, ticker: &str, delay: Duration) -> Self {
            self.delays.insert(ticker.to_string(), delay);
            self
        }
    }

    #[async_trait]
    impl QuoteSource for MockQuoteSource {
        async fn fetch_quote(&self, ticker: &str) -> Result<Quote> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(ticker)
                .copied()
                .unwrap_or(Duration::from_millis(5));
            tokio::time::sleep(delay).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.prices
                .get(ticker)
                .map(|p| Quote::new(*p))
                .ok_or_else(|| anyhow!("No data for {ticker}"))
        }
    }

    #[test]
    fn test_us_quote_is_converted() {
        let holdings = vec![holding("TSM", 10.0, 1000.0, 10000.0)];
        let quotes = HashMap::from([("TSM".to_string(), Ok(Quote::new(15.0)))]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        let tsm = &valuation.holdings[0];
        assert_close(tsm.current_price, 1252.5);
        assert_close(tsm.current_value, 12525.0);
        assert_close(tsm.gain_loss, 2525.0);
        assert_close(tsm.gain_loss_pct, 25.25);
        assert_eq!(tsm.price_source, PriceSource::Live);
    }

    #[test]
    fn test_local_quote_is_not_converted() {
        let holdings = vec![holding("0700.HK", 5.0, 300.0, 1500.0)];
        let quotes = HashMap::from([("0700.HK".to_string(), Ok(Quote::new(320.0)))]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        assert_close(valuation.holdings[0].current_price, 320.0);
        assert_close(valuation.holdings[0].current_value, 1600.0);
    }

    #[test]
    fn test_pinned_price_skips_normalization() {
        let holdings = vec![holding("PLTR", 2.0, 1500.0, 3000.0)];
        // A live quote exists but the pinned override still wins
        let quotes = HashMap::from([("PLTR".to_string(), Ok(Quote::new(20.0)))]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        let pltr = &valuation.holdings[0];
        assert_close(pltr.current_price, 1670.0);
        assert_close(pltr.current_value, 3340.0);
        assert_eq!(pltr.price_source, PriceSource::Pinned);
    }

    #[test]
    fn test_failed_quote_falls_back_to_cost_basis() {
        let holdings = vec![holding("AMD", 2.0, 500.0, 1000.0)];
        let quotes = HashMap::from([("AMD".to_string(), Err(anyhow!("vendor down")))]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        let amd = &valuation.holdings[0];
        assert_close(amd.current_price, 500.0);
        assert_close(amd.current_value, 1000.0);
        assert_close(amd.gain_loss, 0.0);
        assert_eq!(amd.price_source, PriceSource::CostBasis);
    }

    #[test]
    fn test_non_positive_or_missing_quotes_fall_back() {
        let holdings = vec![
            holding("ZERO", 3.0, 100.0, 300.0),
            holding("NEG", 1.0, 50.0, 50.0),
            holding("NAN", 1.0, 70.0, 70.0),
            holding("MISSING", 4.0, 25.0, 100.0),
        ];
        let quotes = HashMap::from([
            ("ZERO".to_string(), Ok(Quote::new(0.0))),
            ("NEG".to_string(), Ok(Quote::new(-1.0))),
            ("NAN".to_string(), Ok(Quote::new(f64::NAN))),
        ]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        for value in &valuation.holdings {
            assert_eq!(value.price_source, PriceSource::CostBasis);
            assert_close(value.current_price, value.holding.buy_price);
            assert_close(value.gain_loss, 0.0);
        }
        assert_eq!(valuation.fallback_count(), 4);
    }

    #[test]
    fn test_totals_and_invested_independent_of_quotes() {
        let holdings = vec![
            holding("TSM", 10.0, 1000.0, 10000.0),
            holding("0700.HK", 5.0, 300.0, 1500.0),
            holding("AMD", 2.0, 500.0, 1000.0),
        ];
        let live = HashMap::from([
            ("TSM".to_string(), Ok(Quote::new(15.0))),
            ("0700.HK".to_string(), Ok(Quote::new(320.0))),
            ("AMD".to_string(), Err(anyhow!("vendor down"))),
        ]);
        let none = HashMap::new();

        let with_quotes = value_portfolio(&holdings, &live, &rules());
        let without_quotes = value_portfolio(&holdings, &none, &rules());

        assert_close(with_quotes.totals.invested, 12500.0);
        assert_close(without_quotes.totals.invested, 12500.0);

        assert_close(with_quotes.totals.current_value, 12525.0 + 1600.0 + 1000.0);
        assert_close(with_quotes.totals.gain_loss, 2625.0);
        assert_close(with_quotes.totals.gain_loss_pct, 21.0);

        assert_close(without_quotes.totals.gain_loss, 0.0);
        assert_close(without_quotes.totals.gain_loss_pct, 0.0);
    }

    #[test]
    fn test_current_value_is_price_times_units() {
        let holdings = vec![
            holding("NVDA", 3.5, 9000.0, 31500.0),
            holding("9988.HK", 12.0, 80.0, 960.0),
        ];
        let quotes = HashMap::from([
            ("NVDA".to_string(), Ok(Quote::new(118.37))),
            ("9988.HK".to_string(), Ok(Quote::new(91.15))),
        ]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        for value in &valuation.holdings {
            assert_eq!(value.current_value, value.current_price * value.holding.units);
        }
    }

    #[test]
    fn test_zero_investment_yields_zero_percentages() {
        let holdings = vec![holding("GIFT", 1.0, 0.0, 0.0)];
        let quotes = HashMap::from([("GIFT".to_string(), Ok(Quote::new(2.0)))]);

        let valuation = value_portfolio(&holdings, &quotes, &rules());
        assert_close(valuation.holdings[0].gain_loss, 167.0);
        assert_eq!(valuation.holdings[0].gain_loss_pct, 0.0);
        assert_eq!(valuation.totals.invested, 0.0);
        assert_eq!(valuation.totals.gain_loss_pct, 0.0);
    }

    #[test]
    fn test_empty_portfolio() {
        let valuation = value_portfolio(&[], &HashMap::new(), &rules());
        assert!(valuation.holdings.is_empty());
        assert_eq!(valuation.totals, PortfolioTotals::default());
    }

    #[tokio::test]
    async fn test_valuate_isolates_failures_and_keeps_order() {
        let source = MockQuoteSource::new()
            .with_price("TSM", 15.0)
            .with_price("0700.HK", 320.0);
        let holdings = vec![
            holding("TSM", 10.0, 1000.0, 10000.0),
            holding("AMD", 2.0, 500.0, 1000.0),
            holding("0700.HK", 5.0, 300.0, 1500.0),
        ];
        let progress = AtomicUsize::new(0);

        let valuation = valuate(
            &holdings,
            &source,
            &rules(),
            &FetchOptions::default(),
            &|| {
                progress.fetch_add(1, Ordering::SeqCst);
            },
        )
        .await;

        let tickers: Vec<&str> = valuation
            .holdings
            .iter()
            .map(|h| h.holding.ticker.as_str())
            .collect();
        assert_eq!(tickers, vec!["TSM", "AMD", "0700.HK"]);
        assert_eq!(valuation.holdings[0].price_source, PriceSource::Live);
        assert_eq!(valuation.holdings[1].price_source, PriceSource::CostBasis);
        assert_eq!(valuation.holdings[2].price_source, PriceSource::Live);
        assert_eq!(progress.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_skips_pinned_and_duplicate_tickers() {
        let source = MockQuoteSource::new().with_price("NVDA", 120.0);
        let holdings = vec![
            holding("NVDA", 1.0, 9000.0, 9000.0),
            holding("NVDA", 2.0, 9500.0, 19000.0),
            holding("PLTR", 2.0, 1500.0, 3000.0),
        ];

        let quotes = fetch_quotes(&holdings, &source, &rules(), &FetchOptions::default(), &|| ())
            .await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(quotes.contains_key("NVDA"));
        assert!(!quotes.contains_key("PLTR"));
    }

    #[tokio::test]
    async fn test_fetch_respects_concurrency_bound() {
        let mut source = MockQuoteSource::new();
        let mut holdings = Vec::new();
        for i in 0..8 {
            let ticker = format!("T{i}");
            source = source
                .with_price(&ticker, 10.0)
                .with_delay(&ticker, Duration::from_millis(20));
            holdings.push(holding(&ticker, 1.0, 1.0, 1.0));
        }
        let options = FetchOptions {
            concurrency: 2,
            timeout: Duration::from_secs(5),
        };

        let quotes = fetch_quotes(&holdings, &source, &rules(), &options, &|| ()).await;

        assert_eq!(quotes.len(), 8);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_slow_quote_times_out_to_cost_basis() {
        let source = MockQuoteSource::new()
            .with_price("SLOW", 99.0)
            .with_delay("SLOW", Duration::from_secs(5))
            .with_price("FAST", 1.0);
        let holdings = vec![
            holding("SLOW", 1.0, 400.0, 400.0),
            holding("FAST", 1.0, 50.0, 50.0),
        ];
        let options = FetchOptions {
            concurrency: 2,
            timeout: Duration::from_millis(50),
        };

        let valuation = valuate(&holdings, &source, &rules(), &options, &|| ()).await;

        assert_eq!(valuation.holdings[0].price_source, PriceSource::CostBasis);
        assert_close(valuation.holdings[0].current_price, 400.0);
        assert_eq!(valuation.holdings[1].price_source, PriceSource::Live);
        assert_close(valuation.holdings[1].current_price, 83.5);
    }
}
