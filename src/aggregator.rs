//! Comparative aggregation: the one place where per-article facts become a
//! single cross-article judgment.
//!
//! Steps 1-3 (distribution, common topics, unique topics) are pure. Step 4 is
//! the narrative comparator and step 5 asks the model for an overall verdict.
//! Both model calls go through [`generate_or_fallback`], so the aggregator
//! always returns a fully shaped [`ComparativeAnalysis`], even for zero
//! articles or a failing model.

use crate::api::{generate_or_fallback, TextGenerator};
use crate::comparator::compare;
use crate::models::{
    Article, ComparativeAnalysis, ComparativeSentimentScore, FallbackNote, Sentiment, Stage,
};
use crate::topics::{sentiment_distribution, topic_overlap};
use itertools::Itertools;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Aggregator output.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    /// The comparative analysis; `final_sentiment_audio_path` is always `None` here.
    pub analysis: ComparativeAnalysis,
    /// Model calls that fell back while building `analysis`.
    pub fallbacks: Vec<FallbackNote>,
}

fn tally_line(distribution: &BTreeMap<Sentiment, usize>) -> String {
    Sentiment::ALL
        .iter()
        .map(|s| format!("{} {}", distribution.get(s).copied().unwrap_or(0), s))
        .join(", ")
}

fn final_sentiment_prompt(
    articles: &[Article],
    common_topics: &[&str],
    distribution: &BTreeMap<Sentiment, usize>,
    company: &str,
) -> String {
    let sentiments = articles.iter().map(|a| a.sentiment.as_str()).join(", ");
    format!(
        "Analyze {company} news coverage:\n\
         - Article Sentiments: [{sentiments}]\n\
         - Sentiment Counts: {}\n\
         - Common Themes: [{}]\n\n\
         **Please count the right number of Positive, Negative and Neutral sentiments.** \
         Your counts must match the Article Sentiments list above.\n\n\
         Provide a concise overall sentiment summary focusing on potential market implications.\n",
        tally_line(distribution),
        common_topics.join(", ")
    )
}

/// Deterministic narrative used when the final model call fails.
pub fn fallback_narrative(company: &str, article_count: usize, distribution: &BTreeMap<Sentiment, usize>) -> String {
    format!(
        "Final sentiment analysis unavailable for {company}. Coverage of {article_count} article(s): {}.",
        tally_line(distribution)
    )
}

/// Build the comparative analysis for `articles` about `company`.
#[instrument(level = "info", skip_all, fields(%company, articles = articles.len()))]
pub async fn aggregate<G: TextGenerator>(generator: &G, articles: &[Article], company: &str) -> Aggregation {
    let distribution = sentiment_distribution(articles);
    let topic_overlap = topic_overlap(articles);
    info!(
        distribution = %tally_line(&distribution),
        common_topics = topic_overlap.common_topics.len(),
        "Computed sentiment distribution and topic overlap"
    );

    let mut fallbacks = Vec::new();

    let comparison = compare(generator, articles, company).await;
    fallbacks.extend(comparison.fallback);

    let common: Vec<&str> = topic_overlap.common_topics.iter().map(String::as_str).collect();
    let prompt = final_sentiment_prompt(articles, &common, &distribution, company);
    let narrative = generate_or_fallback(generator, Stage::FinalNarrative, &prompt, || {
        fallback_narrative(company, articles.len(), &distribution)
    })
    .await;
    if let Some(reason) = narrative.fallback_reason {
        fallbacks.push(FallbackNote {
            stage: Stage::FinalNarrative,
            article: None,
            reason,
        });
    }

    Aggregation {
        analysis: ComparativeAnalysis {
            sentiment_score: ComparativeSentimentScore {
                distribution,
                coverage_differences: comparison.differences,
                topic_overlap,
            },
            final_sentiment_narrative: narrative.text.trim().to_string(),
            final_sentiment_audio_path: None,
        },
        fallbacks,
    }
}
