//! Conversion of raw quotes into the reporting currency

use crate::core::config::AppConfig;
use tracing::debug;

/// Converts vendor quotes into the reporting currency.
///
/// Markets are inferred from the ticker suffix: a ticker ending in one of the
/// local suffixes is already priced in the reporting currency, everything else
/// is taken to be quoted in US dollars and multiplied by `exchange_rate`.
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    exchange_rate: f64,
    local_suffixes: Vec<String>,
}

impl CurrencyNormalizer {
    pub fn new(exchange_rate: f64, local_suffixes: Vec<String>) -> Self {
        CurrencyNormalizer {
            exchange_rate,
            local_suffixes: local_suffixes
                .into_iter()
                .map(|s| s.to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.exchange_rate, config.local_suffixes.clone())
    }

    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }

    pub fn is_local(&self, ticker: &str) -> bool {
        let ticker = ticker.to_ascii_uppercase();
        self.local_suffixes
            .iter()
            .any(|suffix| ticker.ends_with(suffix.as_str()))
    }

    pub fn normalize(&self, ticker: &str, raw_price: f64) -> f64 {
        if self.is_local(ticker) {
            debug!("No conversion needed for local ticker {ticker}");
            return raw_price;
        }
        let converted = raw_price * self.exchange_rate;
        debug!(
            "Converted {ticker} price {raw_price} at rate {}: {converted}",
            self.exchange_rate
        );
        converted
    }
}
