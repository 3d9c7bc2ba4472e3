//! Per-article enrichment: summary, sentiment and topics from raw article text.
//!
//! Each field is one generation call followed by deterministic cleanup of the
//! reply. A failed call never fails the article: the field falls back to a
//! safe default and a [`FallbackNote`] is recorded.

use crate::api::{generate_or_fallback, TextGenerator};
use crate::models::{Article, FallbackNote, FetchedArticle, Sentiment, Stage};
use crate::utils::truncate_words;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

/// Word budget for the summary prompt.
pub const SUMMARY_WORDS: usize = 800;
/// Word budget for the sentiment and topic prompts.
pub const EXCERPT_WORDS: usize = 500;
/// Maximum number of topics kept per article.
pub const MAX_TOPICS: usize = 5;

pub const SUMMARY_FALLBACK: &str = "Summary not available.";

static SUMMARY_LEAD_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(summary:|here's a summary:)").expect("valid regex"));
static TOPIC_LEAD_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(here are the topics:|topics:|3-5 key topics:)").expect("valid regex")
});

/// The three derived fields for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub summary: String,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    /// Stages that fell back, with `article` left unset.
    pub fallbacks: Vec<FallbackNote>,
}

impl Enrichment {
    /// Combine with the fetched metadata and extracted content into an [`Article`].
    pub fn into_article(self, fetched: FetchedArticle, raw_content: String) -> Article {
        Article {
            title: fetched.title,
            description: fetched.description,
            url: fetched.url,
            snippet: fetched.content,
            raw_content,
            summary: self.summary,
            sentiment: self.sentiment,
            topics: self.topics,
        }
    }
}

fn summary_prompt(content: &str) -> String {
    format!(
        "Create a concise, informative summary of this news article in 3-5 sentences.\n\
         Focus on the key facts, main points, and implications.\n\
         Avoid opinions and stick to the information presented in the text.\n\n\
         Article text:\n{}\n\nSummary:\n",
        truncate_words(content, SUMMARY_WORDS)
    )
}

fn sentiment_prompt(content: &str) -> String {
    format!(
        "Analyze the sentiment of this news excerpt.\n\
         Respond with ONLY \"Positive\", \"Negative\", or \"Neutral\".\n\n\
         Excerpt:\n{}\n\nSentiment:\n",
        truncate_words(content, EXCERPT_WORDS)
    )
}

fn topics_prompt(content: &str) -> String {
    format!(
        "Extract 3-5 precise, distinct topics from this news excerpt.\n\
         Respond ONLY with comma-separated topic names.\n\
         Avoid generic terms. Be specific and meaningful.\n\n\
         Excerpt:\n{}\n\nSpecific Topics:\n",
        truncate_words(content, EXCERPT_WORDS)
    )
}

/// Strip a leading "Summary:" / "Here's a summary:" and surrounding whitespace.
pub fn clean_summary(reply: &str) -> String {
    SUMMARY_LEAD_IN.replace(reply, "").trim().to_string()
}

/// Map a free-text reply onto a [`Sentiment`].
///
/// "positive" is checked before "negative", so a reply containing both is
/// Positive. Anything else is Neutral.
pub fn classify_sentiment(reply: &str) -> Sentiment {
    let reply = reply.trim().to_lowercase();
    if reply.contains("positive") {
        Sentiment::Positive
    } else if reply.contains("negative") {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

fn clean_topic(raw: &str) -> Option<String> {
    let topic = TOPIC_LEAD_IN.replace(raw, "");
    let topic = topic.trim();
    let topic = topic.strip_prefix(['"', '\'']).unwrap_or(topic);
    let topic = topic.strip_suffix(['"', '\'']).unwrap_or(topic);
    let topic = topic.trim();
    (!topic.is_empty()).then(|| topic.to_string())
}

/// Split a comma-separated reply into at most [`MAX_TOPICS`] distinct topics.
pub fn parse_topics(reply: &str) -> Vec<String> {
    reply
        .split(',')
        .filter_map(clean_topic)
        .unique()
        .take(MAX_TOPICS)
        .collect()
}

/// Derive summary, sentiment and topics for one article's content.
///
/// The three calls run one after another so an article never holds more than
/// one in-flight request.
#[instrument(level = "info", skip_all, fields(content_bytes = content.len()))]
pub async fn enrich<G: TextGenerator>(generator: &G, content: &str) -> Enrichment {
    let mut fallbacks = Vec::new();
    let mut note = |stage: Stage, reason: Option<String>| {
        if let Some(reason) = reason {
            fallbacks.push(FallbackNote {
                stage,
                article: None,
                reason,
            });
        }
    };

    let summary = generate_or_fallback(generator, Stage::Summary, &summary_prompt(content), || {
        SUMMARY_FALLBACK.to_string()
    })
    .await;
    note(Stage::Summary, summary.fallback_reason);
    let mut summary = clean_summary(&summary.text);
    if summary.is_empty() {
        summary = SUMMARY_FALLBACK.to_string();
    }

    let sentiment = generate_or_fallback(generator, Stage::Sentiment, &sentiment_prompt(content), || {
        Sentiment::Neutral.to_string()
    })
    .await;
    note(Stage::Sentiment, sentiment.fallback_reason);
    let sentiment = classify_sentiment(&sentiment.text);

    let topics = generate_or_fallback(generator, Stage::Topics, &topics_prompt(content), String::new).await;
    note(Stage::Topics, topics.fallback_reason);
    let topics = parse_topics(&topics.text);

    debug!(%sentiment, topic_count = topics.len(), fallbacks = fallbacks.len(), "Enriched article");
    Enrichment {
        summary,
        sentiment,
        topics,
        fallbacks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedGenerator;

    #[test]
    fn test_clean_summary_strips_lead_in() {
        assert_eq!(clean_summary("Summary: Tesla grew."), "Tesla grew.");
        assert_eq!(clean_summary("HERE'S A SUMMARY:\n  Tesla grew.  "), "Tesla grew.");
        assert_eq!(clean_summary("  Tesla grew. Summary: none "), "Tesla grew. Summary: none");
    }

    #[test]
    fn test_classify_sentiment_priority() {
        assert_eq!(classify_sentiment("Positive"), Sentiment::Positive);
        assert_eq!(classify_sentiment("  NEGATIVE."), Sentiment::Negative);
        assert_eq!(classify_sentiment("Mixed, not positive or negative"), Sentiment::Positive);
        assert_eq!(classify_sentiment("Neutral"), Sentiment::Neutral);
        assert_eq!(classify_sentiment("I cannot tell"), Sentiment::Neutral);
    }

    #[test]
    fn test_parse_topics_cleans_and_caps() {
        let topics = parse_topics(
            "Topics: \"Electric Vehicles\", 'Battery Supply', , Cybertruck, FSD, Robotaxi, Earnings",
        );
        assert_eq!(
            topics,
            vec!["Electric Vehicles", "Battery Supply", "Cybertruck", "FSD", "Robotaxi"]
        );
    }

    #[test]
    fn test_parse_topics_lead_ins_and_duplicates() {
        assert_eq!(
            parse_topics("Here are the topics: EV Sales, EV Sales, China"),
            vec!["EV Sales", "China"]
        );
        assert_eq!(parse_topics("3-5 key topics: Layoffs"), vec!["Layoffs"]);
        assert!(parse_topics("").is_empty());
        assert!(parse_topics(" , '' ,").is_empty());
    }

    #[tokio::test]
    async fn test_enrich_uses_each_reply() {
        let generator = ScriptedGenerator::new(|prompt| {
            if prompt.contains("Summary:") {
                Ok("Summary: Deliveries rose 20%.".to_string())
            } else if prompt.contains("Sentiment:") {
                Ok("Positive".to_string())
            } else {
                Ok("Deliveries, Model Y, China".to_string())
            }
        });

        let enrichment = enrich(&generator, "Tesla delivered more cars than expected.").await;
        assert_eq!(enrichment.summary, "Deliveries rose 20%.");
        assert_eq!(enrichment.sentiment, Sentiment::Positive);
        assert_eq!(enrichment.topics, vec!["Deliveries", "Model Y", "China"]);
        assert!(enrichment.fallbacks.is_empty());
        assert_eq!(generator.calls(), 3);
    }

    #[tokio::test]
    async fn test_enrich_falls_back_per_field() {
        let generator = ScriptedGenerator::failing("503 Service Unavailable");
        let enrichment = enrich(&generator, "Error fetching the URL: timed out").await;

        assert_eq!(enrichment.summary, SUMMARY_FALLBACK);
        assert_eq!(enrichment.sentiment, Sentiment::Neutral);
        assert!(enrichment.topics.is_empty());
        let stages: Vec<Stage> = enrichment.fallbacks.iter().map(|n| n.stage).collect();
        assert_eq!(stages, vec![Stage::Summary, Stage::Sentiment, Stage::Topics]);
        assert!(enrichment.fallbacks.iter().all(|n| n.reason.contains("503")));
    }

    #[tokio::test]
    async fn test_enrich_truncates_long_content() {
        let generator = ScriptedGenerator::replying("Neutral");
        let content = "word ".repeat(2_000);
        enrich(&generator, &content).await;

        let prompts = generator.prompts();
        let words = |p: &str| p.matches("word").count();
        assert_eq!(words(&prompts[0]), SUMMARY_WORDS);
        assert_eq!(words(&prompts[1]), EXCERPT_WORDS);
        assert_eq!(words(&prompts[2]), EXCERPT_WORDS);
    }

    #[test]
    fn test_into_article_keeps_metadata() {
        let fetched = FetchedArticle {
            title: "Title".to_string(),
            description: "Desc".to_string(),
            url: "https://example.com/a".to_string(),
            content: "Snippet".to_string(),
        };
        let enrichment = Enrichment {
            summary: "S".to_string(),
            sentiment: Sentiment::Negative,
            topics: vec!["T".to_string()],
            fallbacks: vec![],
        };
        let article = enrichment.into_article(fetched, "Body".to_string());
        assert_eq!(article.snippet, "Snippet");
        assert_eq!(article.raw_content, "Body");
        assert_eq!(article.sentiment, Sentiment::Negative);
    }
}
