//! End-to-end analysis of one company.
//!
//! 1. **Fetching**: search the news source (the only step allowed to fail the run)
//! 2. **Extraction**: download every article page (bounded, ordered)
//! 3. **Enrichment**: summary/sentiment/topics per article (bounded, ordered)
//! 4. **Aggregation**: starts only once every article is enriched
//! 5. **Audio**: optional translated speech of the final narrative

use crate::aggregator::{aggregate, Aggregation};
use crate::api::TextGenerator;
use crate::audio::summarize_to_audio;
use crate::enrich::enrich;
use crate::models::{AnalysisResult, Article, FallbackNote, FetchedArticle};
use crate::scrapers::content::extract_all;
use crate::scrapers::NewsSource;
use chrono::{SecondsFormat, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Where and in which language to render the audio summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioOptions {
    /// Target language code for translation and speech, e.g. `hi`.
    pub language: String,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Maximum number of articles taken from the news source.
    pub max_articles: usize,
    /// Maximum number of page downloads, and of articles being enriched, at once.
    pub concurrency: usize,
    /// `None` disables the audio summary.
    pub audio: Option<AudioOptions>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_articles: 10,
            concurrency: 4,
            audio: None,
        }
    }
}

/// Everything one analysis run needs, borrowed from `main`.
pub struct Analyzer<'a, G> {
    pub http: &'a Client,
    pub generator: &'a G,
    pub source: &'a NewsSource,
    pub options: PipelineOptions,
}

/// Enrich every article, at most `concurrency` at a time, keeping input order.
///
/// Returned fallback notes carry the index of the article they belong to.
#[instrument(level = "info", skip_all, fields(count = fetched.len(), concurrency = concurrency))]
pub async fn enrich_articles<G: TextGenerator>(
    generator: &G,
    fetched: Vec<FetchedArticle>,
    contents: Vec<String>,
    concurrency: usize,
) -> (Vec<Article>, Vec<FallbackNote>) {
    let enriched: Vec<(Article, Vec<FallbackNote>)> = stream::iter(fetched.into_iter().zip(contents).enumerate())
        .map(|(index, (fetched, content))| async move {
            let enrichment = enrich(generator, &content).await;
            let notes = enrichment
                .fallbacks
                .iter()
                .cloned()
                .map(|note| FallbackNote {
                    article: Some(index),
                    ..note
                })
                .collect::<Vec<_>>();
            info!(index, title = %fetched.title, sentiment = %enrichment.sentiment, "Enriched article");
            (enrichment.into_article(fetched, content), notes)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut articles = Vec::with_capacity(enriched.len());
    let mut fallbacks = Vec::new();
    for (article, notes) in enriched {
        articles.push(article);
        fallbacks.extend(notes);
    }
    (articles, fallbacks)
}

impl<'a, G: TextGenerator> Analyzer<'a, G> {
    /// Run the full analysis for `company`.
    ///
    /// # Errors
    ///
    /// Fails only when `company` is blank or the news source cannot be queried.
    #[instrument(level = "info", skip(self), fields(source = self.source.name()))]
    pub async fn analyze(&self, company: &str) -> Result<AnalysisResult, Box<dyn Error>> {
        let company = company.trim();
        if company.is_empty() {
            return Err("company name must not be empty".into());
        }

        let fetched = self
            .source
            .fetch_articles(self.http, company, self.options.max_articles)
            .await?;
        info!(count = fetched.len(), "Fetched article list");

        let urls: Vec<String> = fetched.iter().map(|a| a.url.clone()).collect();
        let contents = extract_all(self.http, &urls, self.options.concurrency).await;

        let (articles, mut fallbacks) =
            enrich_articles(self.generator, fetched, contents, self.options.concurrency).await;

        let Aggregation {
            mut analysis,
            fallbacks: aggregate_fallbacks,
        } = aggregate(self.generator, &articles, company).await;
        fallbacks.extend(aggregate_fallbacks);

        if let Some(audio) = &self.options.audio {
            let path = summarize_to_audio(
                self.http,
                &analysis.final_sentiment_narrative,
                &audio.language,
                &audio.output_dir,
            )
            .await;
            analysis.final_sentiment_audio_path =
                Some(path.map(|p| p.display().to_string()).unwrap_or_default());
        }

        info!(
            articles = articles.len(),
            fallbacks = fallbacks.len(),
            "Analysis complete"
        );
        Ok(AnalysisResult {
            company: company.to_string(),
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            articles,
            comparative: analysis,
            fallbacks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedGenerator;
    use crate::models::{Sentiment, Stage};

    fn fetched(title: &str) -> FetchedArticle {
        FetchedArticle {
            title: title.to_string(),
            description: format!("{title} description"),
            url: format!("https://example.com/{title}"),
            content: String::new(),
        }
    }

    #[tokio::test]
    async fn test_enrich_articles_keeps_order_and_tags_fallbacks() {
        let generator = ScriptedGenerator::new(|prompt| {
            let bad = prompt.contains("broken page");
            if prompt.contains("Sentiment:") {
                if bad {
                    Err("model overloaded".to_string())
                } else if prompt.contains("record profits") {
                    Ok("Positive".to_string())
                } else {
                    Ok("Negative".to_string())
                }
            } else if prompt.contains("Specific Topics:") {
                Ok("EV, Earnings".to_string())
            } else {
                Ok("A short summary.".to_string())
            }
        });

        let (articles, fallbacks) = enrich_articles(
            &generator,
            vec![fetched("a"), fetched("b"), fetched("c")],
            vec![
                "record profits".to_string(),
                "broken page".to_string(),
                "recall announced".to_string(),
            ],
            2,
        )
        .await;

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
        assert_eq!(articles[0].sentiment, Sentiment::Positive);
        assert_eq!(articles[1].sentiment, Sentiment::Neutral);
        assert_eq!(articles[2].sentiment, Sentiment::Negative);
        assert_eq!(articles[1].raw_content, "broken page");
        assert_eq!(articles[0].topics, vec!["EV", "Earnings"]);

        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].stage, Stage::Sentiment);
        assert_eq!(fallbacks[0].article, Some(1));
        assert_eq!(generator.calls(), 9);
    }

    #[tokio::test]
    async fn test_enrich_articles_empty() {
        let generator = ScriptedGenerator::replying("unused");
        let (articles, fallbacks) = enrich_articles(&generator, vec![], vec![], 4).await;
        assert!(articles.is_empty());
        assert!(fallbacks.is_empty());
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_company() {
        let http = Client::new();
        let generator = ScriptedGenerator::replying("unused");
        let source = NewsSource::GoogleNews;
        let analyzer = Analyzer {
            http: &http,
            generator: &generator,
            source: &source,
            options: PipelineOptions::default(),
        };
        assert!(analyzer.analyze("   ").await.is_err());
        assert_eq!(generator.calls(), 0);
    }
}
