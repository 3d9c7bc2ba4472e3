//! Upstream collaborators: news search and article page extraction.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | NewsAPI | [`newsapi`] | JSON API | Requires an API key; sorted by popularity |
//! | Google News | [`google_news`] | RSS search | No key; links go through Google redirects |
//!
//! Page bodies are extracted by [`content`] for either source.
//!
//! Only the news search can fail a run. Page extraction degrades to a
//! descriptive placeholder string instead.

pub mod content;
pub mod google_news;
pub mod newsapi;

use crate::models::FetchedArticle;
use reqwest::Client;
use std::error::Error;

/// Where articles about a company come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsSource {
    NewsApi { api_key: String },
    GoogleNews,
}

impl NewsSource {
    pub fn name(&self) -> &'static str {
        match self {
            NewsSource::NewsApi { .. } => "newsapi",
            NewsSource::GoogleNews => "google-news",
        }
    }

    /// Fetch up to `limit` articles about `company`, most relevant first.
    pub async fn fetch_articles(
        &self,
        client: &Client,
        company: &str,
        limit: usize,
    ) -> Result<Vec<FetchedArticle>, Box<dyn Error>> {
        match self {
            NewsSource::NewsApi { api_key } => newsapi::fetch_articles(client, api_key, company, limit).await,
            NewsSource::GoogleNews => google_news::fetch_articles(client, company, limit).await,
        }
    }
}
