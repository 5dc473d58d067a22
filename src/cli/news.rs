use super::ui;
use crate::core::config::SummarizerProviderConfig;
use crate::core::news::{self, Article, NewsQuery, NewsSource, Summarizer};
use anyhow::Result;
use tracing::warn;

pub fn display_articles(topic: &str, articles: &[Article]) -> String {
    let mut output = format!(
        "{}\n\n",
        ui::style_text(&format!("News: {topic}"), ui::StyleType::Title)
    );
    if articles.is_empty() {
        output.push_str(&ui::style_text("No articles found.", ui::StyleType::Subtle));
        return output;
    }
    for article in articles {
        output.push_str(&format!(
            "• {}\n  {}\n",
            ui::style_text(&article.title, ui::StyleType::TotalLabel),
            ui::style_text(&article.url, ui::StyleType::Subtle)
        ));
        if let Some(description) = article.description.as_deref().filter(|d| !d.is_empty()) {
            output.push_str(&format!("  {description}\n"));
        }
    }
    output
}

fn display_notice(message: &str) -> String {
    ui::style_text(message, ui::StyleType::Error)
}

/// Fetches headlines and optionally a summary. Service failures and missing
/// credentials are printed as notices; they never fail the command.
pub async fn run(
    news_source: Option<&dyn NewsSource>,
    summarizer: Option<&dyn Summarizer>,
    query: &NewsQuery,
    summary_settings: &SummarizerProviderConfig,
    summarize: bool,
) -> Result<()> {
    let Some(news_source) = news_source else {
        println!("{}", display_notice("News unavailable: no news API key configured."));
        return Ok(());
    };

    let pb = ui::new_progress_bar(1, true);
    pb.set_message("Fetching news...");
    let result = news_source.search(query).await;
    pb.finish_and_clear();

    let articles = match result {
        Ok(articles) => articles,
        Err(e) => {
            warn!("News fetch failed: {e:#}");
            println!("{}", display_notice(&format!("Could not fetch news: {e}")));
            return Ok(());
        }
    };
    println!("{}", display_articles(&query.query, &articles));

    if !summarize || articles.is_empty() {
        return Ok(());
    }

    let Some(summarizer) = summarizer else {
        println!(
            "{}",
            display_notice("Summary unavailable: no summarizer API key configured.")
        );
        return Ok(());
    };

    let request = news::build_summary_request(
        &query.query,
        &articles,
        &summary_settings.model,
        summary_settings.temperature,
        summary_settings.max_tokens,
    );
    match summarizer.summarize(&request).await {
        Ok(summary) => println!(
            "\n{}\n\n{summary}",
            ui::style_text("Summary", ui::StyleType::Title)
        ),
        Err(e) => {
            warn!("Summary failed: {e:#}");
            println!("{}", display_notice(&format!("Could not summarize news: {e}")));
        }
    }

    Ok(())
}
