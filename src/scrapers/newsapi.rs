//! NewsAPI "everything" search.
//!
//! Articles are requested sorted by popularity and cut to the configured
//! limit, so the first entries are the provider's most relevant ones. The API
//! key is sent in the `X-Api-Key` header.

use crate::models::FetchedArticle;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use tracing::{debug, info, instrument};

const NEWSAPI_EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    content: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<NewsApiArticle> for FetchedArticle {
    fn from(a: NewsApiArticle) -> Self {
        FetchedArticle {
            title: non_empty(a.title).unwrap_or_else(|| FetchedArticle::NO_TITLE.to_string()),
            description: non_empty(a.description)
                .unwrap_or_else(|| FetchedArticle::NO_DESCRIPTION.to_string()),
            url: a.url.unwrap_or_default(),
            content: a.content.unwrap_or_default(),
        }
    }
}

/// Parse a NewsAPI response body, keeping at most `limit` articles.
///
/// # Errors
///
/// Returns an error when the body is not valid JSON or the provider reports
/// `"status": "error"`.
pub fn parse_response(body: &str, limit: usize) -> Result<Vec<FetchedArticle>, Box<dyn Error>> {
    let response: NewsApiResponse = serde_json::from_str(body)?;
    if response.status != "ok" {
        return Err(format!(
            "NewsAPI returned status '{}' ({}): {}",
            response.status,
            response.code.as_deref().unwrap_or("unknown"),
            response.message.as_deref().unwrap_or("no message")
        )
        .into());
    }
    Ok(response
        .articles
        .into_iter()
        .take(limit)
        .map(FetchedArticle::from)
        .collect())
}

/// Fetch up to `limit` articles mentioning `company`.
#[instrument(level = "info", skip(client, api_key))]
pub async fn fetch_articles(
    client: &Client,
    api_key: &str,
    company: &str,
    limit: usize,
) -> Result<Vec<FetchedArticle>, Box<dyn Error>> {
    let url = format!(
        "{}?q={}&sortBy=popularity",
        NEWSAPI_EVERYTHING_URL,
        urlencoding::encode(company)
    );
    debug!(%url, "Requesting NewsAPI");

    let response = client.get(&url).header("X-Api-Key", api_key).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        // NewsAPI explains failures in the body; surface that message when it parses.
        return match parse_response(&body, limit) {
            Err(e) => Err(e),
            Ok(_) => Err(format!("NewsAPI request failed with HTTP {status}").into()),
        };
    }

    let articles = parse_response(&body, limit)?;
    info!(count = articles.len(), "Fetched articles from NewsAPI");
    Ok(articles)
}
