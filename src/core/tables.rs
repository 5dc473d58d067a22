//! Loading of the two static tables: the portfolio and the AI stock universe.
//!
//! Both tables are delimited text with a header row. Header names are the
//! contract: a missing column, an unparseable number or a non-positive unit
//! count aborts loading with an error naming the file, row and column.

use crate::core::cache::Cache;
use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const BUY_PRICE: &str = "Buy Price";
const INVESTMENT: &str = "Investment";

/// One row of the portfolio table. `investment` is the stored cost at entry
/// time and is never recomputed from `units * buy_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(rename = "Stock")]
    pub stock: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Units")]
    pub units: f64,
    #[serde(rename = "Buy Price")]
    pub buy_price: f64,
    #[serde(rename = "Investment")]
    pub investment: f64,
    #[serde(rename = "Barbell Type")]
    pub barbell_type: String,
}

/// One row of the AI stock universe. `P/E` and `YTD %` are kept as text
/// since vendors publish placeholders such as `N/A` for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(rename = "Stock")]
    pub stock: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "P/E")]
    pub pe_ratio: String,
    #[serde(rename = "YTD %")]
    pub ytd_pct: String,
    #[serde(rename = "Region")]
    pub region: String,
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

impl WatchlistEntry {
    pub fn pe(&self) -> Option<f64> {
        parse_number(&self.pe_ratio)
    }

    pub fn ytd(&self) -> Option<f64> {
        parse_number(&self.ytd_pct)
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open table: {}", path.display()))?;
    Ok(ReaderBuilder::new().trim(Trim::All).from_reader(file))
}

fn require_columns(path: &Path, headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        bail!(
            "Table {} is missing required column(s): {}",
            path.display(),
            missing.join(", ")
        );
    }
    Ok(())
}

/// Loads the portfolio table. The cost columns carry the reporting currency
/// in their name, e.g. `Buy Price (INR)` and `Investment (INR)`.
pub fn load_portfolio(path: &Path, reporting_currency: &str) -> Result<Vec<Holding>> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();

    let buy_price_column = format!("{BUY_PRICE} ({reporting_currency})");
    let investment_column = format!("{INVESTMENT} ({reporting_currency})");
    require_columns(
        path,
        &headers,
        &[
            "Stock",
            "Ticker",
            "Units",
            buy_price_column.as_str(),
            investment_column.as_str(),
            "Barbell Type",
        ],
    )?;

    let canonical: StringRecord = headers
        .iter()
        .map(|h| {
            if h == buy_price_column {
                BUY_PRICE
            } else if h == investment_column {
                INVESTMENT
            } else {
                h
            }
        })
        .collect();

    let mut holdings = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is line 1
        let line = index + 2;
        let record =
            record.with_context(|| format!("Failed to read row {line} of {}", path.display()))?;
        let holding: Holding = record
            .deserialize(Some(&canonical))
            .with_context(|| format!("Malformed row {line} in {}", path.display()))?;
        if holding.ticker.is_empty() {
            bail!("Row {line} in {} has an empty Ticker", path.display());
        }
        if !(holding.units.is_finite() && holding.units > 0.0) {
            bail!(
                "Row {line} in {} has non-positive Units for {}",
                path.display(),
                holding.ticker
            );
        }
        holdings.push(holding);
    }

    info!("Loaded {} holdings from {}", holdings.len(), path.display());
    Ok(holdings)
}

pub fn load_watchlist(path: &Path) -> Result<Vec<WatchlistEntry>> {
    let mut reader = open_reader(path)?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();
    require_columns(path, &headers, &["Stock", "Ticker", "P/E", "YTD %", "Region"])?;

    let mut entries = Vec::new();
    for (index, record) in reader.deserialize::<WatchlistEntry>().enumerate() {
        let line = index + 2;
        let entry =
            record.with_context(|| format!("Malformed row {line} in {}", path.display()))?;
        entries.push(entry);
    }

    info!("Loaded {} watchlist entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Memoizes table loads for the lifetime of the process.
#[derive(Default)]
pub struct TableStore {
    portfolios: Cache<PathBuf, Arc<Vec<Holding>>>,
    watchlists: Cache<PathBuf, Arc<Vec<WatchlistEntry>>>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn portfolio(
        &self,
        path: &Path,
        reporting_currency: &str,
    ) -> Result<Arc<Vec<Holding>>> {
        let key = path.to_path_buf();
        if let Some(cached) = self.portfolios.get(&key).await {
            return Ok(cached);
        }
        debug!("Reading portfolio table {}", path.display());
        let holdings = Arc::new(load_portfolio(path, reporting_currency)?);
        self.portfolios.put(key, Arc::clone(&holdings)).await;
        Ok(holdings)
    }

    pub async fn watchlist(&self, path: &Path) -> Result<Arc<Vec<WatchlistEntry>>> {
        let key = path.to_path_buf();
        if let Some(cached) = self.watchlists.get(&key).await {
            return Ok(cached);
        }
        debug!("Reading watchlist table {}", path.display());
        let entries = Arc::new(load_watchlist(path)?);
        self.watchlists.put(key, Arc::clone(&entries)).await;
        Ok(entries)
    }
}
