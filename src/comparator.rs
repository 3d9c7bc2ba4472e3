//! Narrative comparison of the first two articles.
//!
//! The model is asked for a reply in a fixed two-label format:
//!
//! ```text
//! Comparison: <narrative differences>
//! Impact: <market or investor implications>
//! ```
//!
//! Each label is parsed independently and replaced by a templated default
//! when missing. Fewer than two articles is not an error: a fixed placeholder
//! is returned without calling the model.

use crate::api::{generate_or_fallback, TextGenerator};
use crate::models::{Article, FallbackNote, NarrativeDiff, Stage};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument};

pub const INSUFFICIENT_COMPARISON: &str = "Insufficient articles for comparative analysis.";
pub const INSUFFICIENT_IMPACT: &str = "No comparative insights available.";

// Labels only count at the start of a line, optionally after a list or heading marker.
static COMPARISON_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ims)^[ \t]*(?:[-*#>]+[ \t]*)?comparison[ \t]*:\s*(.*?)\s*(?:^[ \t]*(?:[-*#>]+[ \t]*)?impact[ \t]*:|\z)",
    )
    .expect("valid regex")
});
static IMPACT_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ims)^[ \t]*(?:[-*#>]+[ \t]*)?impact[ \t]*:\s*(.*)\z").expect("valid regex")
});

/// Comparator output: the differences plus a note when the model call fell back.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub differences: Vec<NarrativeDiff>,
    pub fallback: Option<FallbackNote>,
}

/// The fixed diff used when there are fewer than two articles.
pub fn insufficient_articles() -> NarrativeDiff {
    NarrativeDiff {
        comparison: INSUFFICIENT_COMPARISON.to_string(),
        impact: INSUFFICIENT_IMPACT.to_string(),
    }
}

fn failed_call(company: &str) -> NarrativeDiff {
    NarrativeDiff {
        comparison: format!("Diverse coverage highlighting different aspects of {company} business."),
        impact: format!("Multiple perspectives provide a nuanced view of {company}'s current situation."),
    }
}

fn describe(n: usize, article: &Article) -> String {
    format!(
        "Article {n}:\n- Title: {}\n- Topics: [{}]\n- Sentiment: {}\n- Summary: {}\n",
        article.title,
        article.topics.iter().join(", "),
        article.sentiment,
        article.summary
    )
}

fn comparison_prompt(first: &Article, second: &Article, company: &str) -> String {
    format!(
        "Analyze the following two articles about {company}:\n\n{}\n{}\n\
         Provide a detailed comparison that focuses on:\n\
         1. Narrative differences between the two articles\n\
         2. Contrasting perspectives\n\
         3. Potential market or investor implications\n\n\
         Format your response as:\n\
         Comparison: [Specific narrative differences]\n\
         Impact: [Market or investor implications]\n",
        describe(1, first),
        describe(2, second)
    )
}

fn capture(re: &Regex, reply: &str) -> Option<String> {
    re.captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a `Comparison:` / `Impact:` reply, defaulting each missing field.
pub fn parse_comparison(reply: &str, company: &str) -> NarrativeDiff {
    let reply = reply.replace("**", "");
    NarrativeDiff {
        comparison: capture(&COMPARISON_LABEL, &reply).unwrap_or_else(|| {
            format!("Articles present different perspectives on {company} recent developments.")
        }),
        impact: capture(&IMPACT_LABEL, &reply).unwrap_or_else(|| {
            format!("Varying coverage of {company} may create mixed signals for investors and market perception.")
        }),
    }
}

/// Compare the narratives of the first two articles. Never fails.
#[instrument(level = "info", skip_all, fields(%company, articles = articles.len()))]
pub async fn compare<G: TextGenerator>(generator: &G, articles: &[Article], company: &str) -> Comparison {
    let [first, second, ..] = articles else {
        info!("Fewer than two articles; skipping narrative comparison");
        return Comparison {
            differences: vec![insufficient_articles()],
            fallback: None,
        };
    };

    let prompt = comparison_prompt(first, second, company);
    let generation = generate_or_fallback(generator, Stage::Comparison, &prompt, String::new).await;

    match generation.fallback_reason {
        Some(reason) => Comparison {
            differences: vec![failed_call(company)],
            fallback: Some(FallbackNote {
                stage: Stage::Comparison,
                article: None,
                reason,
            }),
        },
        None => Comparison {
            differences: vec![parse_comparison(&generation.text, company)],
            fallback: None,
        },
    }
}
