use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

fn default_reporting_currency() -> String {
    "INR".to_string()
}

fn default_exchange_rate() -> f64 {
    83.5
}

fn default_local_suffixes() -> Vec<String> {
    vec![".HK".to_string(), ".SZ".to_string(), ".SS".to_string()]
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TablesConfig {
    pub portfolio: PathBuf,
    pub watchlist: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScreeningConfig {
    pub pe_threshold: f64,
    pub momentum_threshold: f64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        ScreeningConfig {
            pe_threshold: 20.0,
            momentum_threshold: 30.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct YahooProviderConfig {
    pub base_url: String,
    /// Maximum number of quote requests in flight at once.
    pub concurrency: usize,
    /// Per-request timeout; a quote that takes longer falls back to cost basis.
    pub timeout_secs: u64,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        YahooProviderConfig {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            concurrency: 4,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct NewsProviderConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub default_query: String,
    pub language: String,
    pub sort_by: String,
    pub page_size: u32,
}

impl Default for NewsProviderConfig {
    fn default() -> Self {
        NewsProviderConfig {
            base_url: "https://newsapi.org".to_string(),
            api_key_env: "NEWS_API_KEY".to_string(),
            default_query: "artificial intelligence stocks".to_string(),
            language: "en".to_string(),
            sort_by: "publishedAt".to_string(),
            page_size: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SummarizerProviderConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for SummarizerProviderConfig {
    fn default() -> Self {
        SummarizerProviderConfig {
            base_url: "https://api.openai.com".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 400,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub yahoo: YahooProviderConfig,
    pub news: NewsProviderConfig,
    pub summarizer: SummarizerProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_reporting_currency")]
    pub reporting_currency: String,
    /// Units of reporting currency per US dollar. Updated by hand.
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    /// Ticker suffixes whose quotes are taken as already in the reporting currency.
    #[serde(default = "default_local_suffixes")]
    pub local_suffixes: Vec<String>,
    /// Reporting-currency prices that replace the vendor quote for known-bad symbols.
    #[serde(default)]
    pub pinned_prices: HashMap<String, f64>,
    pub tables: TablesConfig,
    #[serde(default)]
    pub screening: ScreeningConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(skip)]
    config_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "shadowfolio", "shadowfolio")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.config_dir = path.as_ref().parent().map(Path::to_path_buf);
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Resolves a table path; relative paths are taken from the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.config_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn portfolio_path(&self) -> PathBuf {
        self.resolve_path(&self.tables.portfolio)
    }

    pub fn watchlist_path(&self) -> PathBuf {
        self.resolve_path(&self.tables.watchlist)
    }
}
