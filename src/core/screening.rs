//! Search and flagging over the AI stock watchlist.
use crate::core::config::ScreeningConfig;
use crate::core::tables::WatchlistEntry;
use std::collections::BTreeMap;

/// A watchlist entry with its screening flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenedEntry {
    pub entry: WatchlistEntry,
    pub undervalued: bool,
    pub high_momentum: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScreeningRules {
    pub pe_threshold: f64,
    pub momentum_threshold: f64,
}

impl Default for ScreeningRules {
    fn default() -> Self {
        ScreeningRules {
            pe_threshold: 20.0,
            momentum_threshold: 30.0,
        }
    }
}

impl From<&ScreeningConfig> for ScreeningRules {
    fn from(config: &ScreeningConfig) -> Self {
        ScreeningRules {
            pe_threshold: config.pe_threshold,
            momentum_threshold: config.momentum_threshold,
        }
    }
}

impl ScreeningRules {
    /// Unparseable P/E values are never undervalued.
    pub fn is_undervalued(&self, entry: &WatchlistEntry) -> bool {
        entry.pe().is_some_and(|pe| pe < self.pe_threshold)
    }

    pub fn is_high_momentum(&self, entry: &WatchlistEntry) -> bool {
        entry.ytd().is_some_and(|ytd| ytd > self.momentum_threshold)
    }

    pub fn annotate(&self, entry: &WatchlistEntry) -> ScreenedEntry {
        ScreenedEntry {
            entry: entry.clone(),
            undervalued: self.is_undervalued(entry),
            high_momentum: self.is_high_momentum(entry),
        }
    }
}

/// Case-insensitive substring search on name or ticker. A blank or absent
/// term keeps every entry.
pub fn filter<'a>(
    watchlist: &'a [WatchlistEntry],
    term: Option<&str>,
) -> Vec<&'a WatchlistEntry> {
    let term = term.map(str::trim).unwrap_or_default().to_lowercase();
    if term.is_empty() {
        return watchlist.iter().collect();
    }
    watchlist
        .iter()
        .filter(|e| {
            e.stock.to_lowercase().contains(&term) || e.ticker.to_lowercase().contains(&term)
        })
        .collect()
}

/// Filters then flags the watchlist.
pub fn screen(
    watchlist: &[WatchlistEntry],
    term: Option<&str>,
    rules: &ScreeningRules,
) -> Vec<ScreenedEntry> {
    filter(watchlist, term)
        .into_iter()
        .map(|entry| rules.annotate(entry))
        .collect()
}

/// Number of screened entries per region, ordered by region name.
pub fn count_by_region(entries: &[ScreenedEntry]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for screened in entries {
        *counts.entry(screened.entry.region.clone()).or_default() += 1;
    }
    counts.into_iter().collect()
}
