//! Quote abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Latest closing price of a ticker as reported by the vendor, before any
/// currency normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub currency: Option<String>,
    pub as_of: Option<NaiveDate>,
}

impl Quote {
    pub fn new(price: f64) -> Self {
        Quote {
            price,
            currency: None,
            as_of: None,
        }
    }

    /// A quote is usable only when it carries a finite, positive price.
    pub fn is_usable(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Result<Quote>;
}
