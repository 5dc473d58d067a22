pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::news::{NewsQuery, NewsSource, Summarizer};
use crate::core::tables::TableStore;
use crate::providers::news_api::NewsApiSource;
use crate::providers::openai::OpenAiSummarizer;
use crate::providers::yahoo_finance::YahooQuoteSource;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Portfolio {
        refresh_secs: Option<u64>,
    },
    Watchlist {
        search: Option<String>,
    },
    News {
        query: Option<String>,
        summarize: bool,
    },
}

/// Reads an API key from the environment variable named in config.
fn api_key(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Some(key),
        _ => {
            debug!("No API key found in {var}");
            None
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("shadowfolio starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // Both tables are required up front, whichever view is requested
    let tables = TableStore::new();
    tables
        .portfolio(&config.portfolio_path(), &config.reporting_currency)
        .await?;
    tables.watchlist(&config.watchlist_path()).await?;

    match command {
        AppCommand::Portfolio { refresh_secs } => {
            let quote_source = YahooQuoteSource::new(&config.providers.yahoo.base_url)?;
            let refresh = refresh_secs.filter(|s| *s > 0).map(Duration::from_secs);
            cli::portfolio::run(&config, &tables, &quote_source, refresh).await
        }
        AppCommand::Watchlist { search } => {
            cli::watchlist::run(&config, &tables, search.as_deref()).await
        }
        AppCommand::News { query, summarize } => {
            let news_config = &config.providers.news;
            let summarizer_config = &config.providers.summarizer;

            let news_source = api_key(&news_config.api_key_env)
                .map(|key| NewsApiSource::new(&news_config.base_url, key))
                .transpose()?;
            let summarizer = if summarize {
                api_key(&summarizer_config.api_key_env)
                    .map(|key| OpenAiSummarizer::new(&summarizer_config.base_url, key))
                    .transpose()?
            } else {
                None
            };

            let query = NewsQuery {
                query: query.unwrap_or_else(|| news_config.default_query.clone()),
                sort_by: news_config.sort_by.clone(),
                language: news_config.language.clone(),
                page_size: news_config.page_size,
            };

            cli::news::run(
                news_source.as_ref().map(|s| s as &dyn NewsSource),
                summarizer.as_ref().map(|s| s as &dyn Summarizer),
                &query,
                summarizer_config,
                summarize,
            )
            .await
        }
    }
}
