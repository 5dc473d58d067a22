//! News search and language-model summary abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsQuery {
    pub query: String,
    pub sort_by: String,
    pub language: String,
    pub page_size: u32,
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, query: &NewsQuery) -> Result<Vec<Article>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

const SYSTEM_PROMPT: &str = "You are an equity research assistant. Summarize the news for an \
investor tracking AI stocks in a few short bullet points. Mention companies by name and note \
anything that could move their share price. Do not give investment advice.";

/// Builds the summary prompt for a topic from its headlines, in article order.
pub fn build_summary_request(
    topic: &str,
    articles: &[Article],
    model: &str,
    temperature: f64,
    max_tokens: u32,
) -> SummaryRequest {
    let mut prompt = format!("Topic: {topic}\n\nHeadlines:\n");
    for (i, article) in articles.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, article.title));
        if let Some(description) = article.description.as_deref().filter(|d| !d.is_empty()) {
            prompt.push_str(&format!("   {description}\n"));
        }
    }

    SummaryRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
        temperature,
        max_tokens,
    }
}
