//! Data models for fetched articles, enriched articles and the comparative analysis.
//!
//! This module defines the core data structures used throughout the application:
//! - [`FetchedArticle`]: Raw article metadata as returned by a news source
//! - [`Article`]: An article after content extraction and LLM enrichment
//! - [`ComparativeAnalysis`]: The cross-article comparison built by the aggregator
//! - [`AnalysisResult`]: The complete document written for one company
//!
//! The serialized field names follow the JSON document served by the
//! news analysis API ("Company", "Articles", "Comparative Analysis", ...), hence
//! the explicit `#[serde(rename)]` attributes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Sentiment label assigned to a single article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An article as returned by a news source, before its page is scraped.
///
/// Missing provider fields are replaced with fixed placeholders, so
/// downstream prompts never see empty titles.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedArticle {
    /// The article headline.
    pub title: String,
    /// The provider's short description of the article.
    pub description: String,
    /// Link to the full article page.
    pub url: String,
    /// The provider's (usually truncated) content snippet.
    pub content: String,
}

impl FetchedArticle {
    pub const NO_TITLE: &'static str = "No headline available";
    pub const NO_DESCRIPTION: &'static str = "No summary available";
}

/// A fully enriched article.
///
/// `summary`, `sentiment` and `topics` are filled in by the enricher before the
/// article reaches the aggregator and are never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "Title")]
    pub title: String,
    pub description: String,
    pub url: String,
    /// Provider snippet.
    #[serde(rename = "content")]
    pub snippet: String,
    /// Text extracted from the article page, or a description of why extraction failed.
    #[serde(rename = "article_content")]
    pub raw_content: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "Sentiment")]
    pub sentiment: Sentiment,
    /// At most five short topic names, in the order the model produced them.
    #[serde(rename = "Topics")]
    pub topics: Vec<String>,
}

impl Article {
    /// The article's topics as a set (duplicates collapsed, order irrelevant).
    pub fn topic_set(&self) -> BTreeSet<String> {
        self.topics.iter().cloned().collect()
    }
}

/// Narrative comparison between articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeDiff {
    #[serde(rename = "Comparison")]
    pub comparison: String,
    #[serde(rename = "Impact")]
    pub impact: String,
}

/// Set comparison of the topics extracted from each article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicOverlap {
    /// Topics present in every article.
    #[serde(rename = "Common Topics")]
    pub common_topics: BTreeSet<String>,
    /// Topics only the first article mentions.
    #[serde(rename = "Unique Topics in Article 1")]
    pub unique_topics_in_article_1: BTreeSet<String>,
    /// Topics only the second article mentions.
    #[serde(rename = "Unique Topics in Article 2")]
    pub unique_topics_in_article_2: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparativeSentimentScore {
    /// Count of articles per sentiment. Sentiments with no articles are absent.
    #[serde(rename = "Sentiment Distribution")]
    pub distribution: BTreeMap<Sentiment, usize>,
    #[serde(rename = "Coverage Differences")]
    pub coverage_differences: Vec<NarrativeDiff>,
    #[serde(rename = "Topic Overlap")]
    pub topic_overlap: TopicOverlap,
}

impl ComparativeSentimentScore {
    /// Number of articles with the given sentiment, treating a missing key as zero.
    pub fn count(&self, sentiment: Sentiment) -> usize {
        self.distribution.get(&sentiment).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    #[serde(rename = "Comparative Sentiment Score")]
    pub sentiment_score: ComparativeSentimentScore,
    #[serde(rename = "Final Sentiment Analysis")]
    pub final_sentiment_narrative: String,
    /// `None` when audio was not requested; `Some("")` when synthesis produced nothing.
    #[serde(
        rename = "Final Sentiment Analysis Hindi Audio",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub final_sentiment_audio_path: Option<String>,
}

/// Pipeline stage that issued a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Summary,
    Sentiment,
    Topics,
    Comparison,
    FinalNarrative,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Summary => "summary",
            Stage::Sentiment => "sentiment",
            Stage::Topics => "topics",
            Stage::Comparison => "comparison",
            Stage::FinalNarrative => "final_narrative",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records that a generation call failed and a fallback value was used instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackNote {
    pub stage: Stage,
    /// Index into `AnalysisResult::articles` for per-article stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<usize>,
    pub reason: String,
}

/// The complete analysis document for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "Company")]
    pub company: String,
    /// RFC 3339 timestamp of when the analysis finished.
    #[serde(rename = "Generated At")]
    pub generated_at: String,
    #[serde(rename = "Articles")]
    pub articles: Vec<Article>,
    #[serde(rename = "Comparative Analysis")]
    pub comparative: ComparativeAnalysis,
    #[serde(rename = "Fallbacks", default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackNote>,
}

#[cfg(test)]
pub(crate) fn article(title: &str, sentiment: Sentiment, topics: &[&str]) -> Article {
    Article {
        title: title.to_string(),
        description: format!("{title} description"),
        url: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        snippet: String::new(),
        raw_content: format!("{title} body"),
        summary: format!("{title} summary"),
        sentiment,
        topics: topics.iter().map(|t| t.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_serializes_as_label() {
        let json = serde_json::to_string(&Sentiment::Negative).unwrap();
        assert_eq!(json, "\"Negative\"");
    }

    #[test]
    fn test_distribution_keys_serialize_as_labels() {
        let score = ComparativeSentimentScore {
            distribution: BTreeMap::from([(Sentiment::Positive, 2), (Sentiment::Neutral, 1)]),
            coverage_differences: vec![],
            topic_overlap: TopicOverlap::default(),
        };
        let value = serde_json::to_value(&score).unwrap();
        assert_eq!(value["Sentiment Distribution"]["Positive"], 2);
        assert_eq!(value["Sentiment Distribution"]["Neutral"], 1);
        assert!(value["Sentiment Distribution"].get("Negative").is_none());
        assert_eq!(score.count(Sentiment::Negative), 0);
    }

    #[test]
    fn test_article_uses_service_keys() {
        let a = article("Tesla Beats Estimates", Sentiment::Positive, &["EV", "Earnings"]);
        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["Title"], "Tesla Beats Estimates");
        assert_eq!(value["Sentiment"], "Positive");
        assert_eq!(value["Topics"][1], "Earnings");
        assert_eq!(value["article_content"], "Tesla Beats Estimates body");
    }

    #[test]
    fn test_topic_set_collapses_duplicates() {
        let a = article("Dupes", Sentiment::Neutral, &["EV", "EV", "Battery"]);
        let set = a.topic_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("Battery"));
    }

    #[test]
    fn test_audio_key_omitted_when_not_requested() {
        let mut analysis = ComparativeAnalysis {
            sentiment_score: ComparativeSentimentScore {
                distribution: BTreeMap::new(),
                coverage_differences: vec![],
                topic_overlap: TopicOverlap::default(),
            },
            final_sentiment_narrative: "Mixed.".to_string(),
            final_sentiment_audio_path: None,
        };
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(!json.contains("Hindi Audio"));

        analysis.final_sentiment_audio_path = Some(String::new());
        let value = serde_json::to_value(&analysis).unwrap();
        assert_eq!(value["Final Sentiment Analysis Hindi Audio"], "");
    }

    #[test]
    fn test_analysis_result_round_trip_keeps_fallbacks() {
        let json = r#"{
            "Company": "Tesla",
            "Generated At": "2025-05-06T20:30:00Z",
            "Articles": [],
            "Comparative Analysis": {
                "Comparative Sentiment Score": {
                    "Sentiment Distribution": {},
                    "Coverage Differences": [],
                    "Topic Overlap": {
                        "Common Topics": [],
                        "Unique Topics in Article 1": [],
                        "Unique Topics in Article 2": []
                    }
                },
                "Final Sentiment Analysis": "None."
            },
            "Fallbacks": [{"stage": "final_narrative", "reason": "timeout"}]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.company, "Tesla");
        assert_eq!(result.fallbacks[0].stage, Stage::FinalNarrative);
        assert_eq!(result.fallbacks[0].article, None);
        assert!(result.comparative.final_sentiment_audio_path.is_none());
    }
}
