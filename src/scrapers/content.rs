//! Article page download and main-text extraction.
//!
//! Extraction never fails: network and parse problems are returned as a
//! descriptive string in place of the content, and the enricher works on
//! whatever text it is given.

use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Browser User-Agent; many publishers refuse requests without one.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const NO_URL: &str = "No URL provided";
pub const NOT_EXTRACTED: &str = "Could not extract main content";

/// Candidate containers for the article body, most specific first.
const CONTENT_SELECTORS: [&str; 3] = ["div.article__content", "main", "article"];

/// Text of the first element matching one of [`CONTENT_SELECTORS`], whitespace-normalized.
pub fn extract_main_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    CONTENT_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|selector| document.select(&selector).next())
        .map(|element| {
            element
                .text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|text| !text.is_empty())
}

async fn fetch_page(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let url = Url::parse(url)?;
    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.text().await?)
}

/// Download `url` and return its main text, or a description of what went wrong.
#[instrument(level = "info", skip(client))]
pub async fn extract(client: &Client, url: &str) -> String {
    if url.trim().is_empty() {
        return NO_URL.to_string();
    }

    match fetch_page(client, url).await {
        Ok(html) => match extract_main_text(&html) {
            Some(text) => {
                debug!(bytes = text.len(), "Extracted article content");
                text
            }
            None => {
                warn!("No main content container found");
                NOT_EXTRACTED.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "Article fetch failed");
            format!("Error fetching the URL: {e}")
        }
    }
}

/// Extract every URL with at most `concurrency` downloads in flight, preserving order.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn extract_all(client: &Client, urls: &[String], concurrency: usize) -> Vec<String> {
    let contents: Vec<String> = stream::iter(urls)
        .map(|url| extract(client, url))
        .buffered(concurrency.max(1))
        .collect()
        .await;
    info!(count = contents.len(), "Extracted article contents");
    contents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_article_content_div() {
        let html = r#"<html><body>
            <main>Navigation and more</main>
            <div class="article__content"><p>First   paragraph.</p><p>Second.</p></div>
        </body></html>"#;
        assert_eq!(extract_main_text(html).unwrap(), "First paragraph. Second.");
    }

    #[test]
    fn test_falls_back_to_main_then_article() {
        let main = "<html><body><main><h1>Title</h1><p>Body</p></main></body></html>";
        assert_eq!(extract_main_text(main).unwrap(), "Title Body");

        let article = "<html><body><article>Only article</article></body></html>";
        assert_eq!(extract_main_text(article).unwrap(), "Only article");
    }

    #[test]
    fn test_no_container_is_none() {
        assert!(extract_main_text("<html><body><div>Just a div</div></body></html>").is_none());
        assert!(extract_main_text("<html><body><article>   </article></body></html>").is_none());
    }

    #[tokio::test]
    async fn test_extract_empty_url() {
        let client = Client::new();
        assert_eq!(extract(&client, "").await, NO_URL);
    }

    #[tokio::test]
    async fn test_extract_invalid_url_becomes_content() {
        let client = Client::new();
        let content = extract(&client, "not a url").await;
        assert!(content.starts_with("Error fetching the URL:"));
    }
}
