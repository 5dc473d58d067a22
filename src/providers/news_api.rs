use crate::core::news::{Article, NewsQuery, NewsSource};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// News source backed by NewsAPI's `/v2/everything` search.
pub struct NewsApiSource {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl NewsApiSource {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("shadowfolio/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(NewsApiSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

#[async_trait]
impl NewsSource for NewsApiSource {
    #[instrument(name = "NewsSearch", skip(self), fields(query = %query.query))]
    async fn search(&self, query: &NewsQuery) -> Result<Vec<Article>> {
        let url = format!("{}/v2/everything", self.base_url);
        let page_size = query.page_size.to_string();
        debug!("Requesting news from {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query.query.as_str()),
                ("sortBy", query.sort_by.as_str()),
                ("language", query.language.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("News request failed: {}", e))?;

        let status = response.status();
        let text = response.text().await?;
        let data: NewsApiResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse news response ({}): {}", status, e))?;

        if !status.is_success() || data.status != "ok" {
            return Err(anyhow!(
                "News API error ({}): {}",
                status,
                data.message.unwrap_or_else(|| data.status.clone())
            ));
        }

        let articles: Vec<Article> = data
            .articles
            .into_iter()
            .filter_map(|a| match (a.title, a.url) {
                (Some(title), Some(url)) => Some(Article {
                    title,
                    url,
                    description: a.description,
                }),
                _ => None,
            })
            .collect();
        debug!("Received {} articles", articles.len());
        Ok(articles)
    }
}
