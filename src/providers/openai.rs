use crate::core::news::{ChatMessage, SummaryRequest, Summarizer};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Summarizer backed by an OpenAI-compatible chat completions API.
pub struct OpenAiSummarizer {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiSummarizer {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("shadowfolio/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(OpenAiSummarizer {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    #[instrument(name = "Summarize", skip(self, request), fields(model = %request.model))]
    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!("Requesting summary from {}", url);

        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Summary request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Summary API error ({}): {}", status, text));
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse summary response: {}", e))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow!("Summary API returned no content"))
    }
}
