//! Markdown rendering of an [`AnalysisResult`].
//!
//! The report leads with the overall verdict, then the sentiment table,
//! topic overlap and narrative comparison, and ends with one section per
//! article in the order the news source ranked them.

use super::Edition;
use crate::models::{AnalysisResult, Sentiment};
use crate::utils::{slugify, upcase};
use itertools::Itertools;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Write;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

fn topic_list(topics: &BTreeSet<String>) -> String {
    if topics.is_empty() {
        "_none_".to_string()
    } else {
        topics.iter().join(", ")
    }
}

/// Render the full report.
pub fn analysis_to_markdown(result: &AnalysisResult, edition: &Edition) -> String {
    let mut md = String::new();
    let comparative = &result.comparative;
    let score = &comparative.sentiment_score;

    writeln!(md, "# {} News Analysis\n", result.company).unwrap();
    writeln!(
        md,
        "*{} edition, {}* · {} article(s) · generated {}\n",
        upcase(&edition.time_of_day),
        edition.local_date,
        result.articles.len(),
        result.generated_at
    )
    .unwrap();

    writeln!(md, "## Overall Sentiment\n").unwrap();
    writeln!(md, "{}\n", comparative.final_sentiment_narrative).unwrap();
    match comparative.final_sentiment_audio_path.as_deref() {
        Some("") => writeln!(md, "_Audio summary could not be generated._\n").unwrap(),
        Some(path) => writeln!(md, "Audio summary: [`{path}`]({path})\n").unwrap(),
        None => {}
    }

    writeln!(md, "## Sentiment Distribution\n").unwrap();
    writeln!(md, "| Sentiment | Articles |\n|-----------|----------|").unwrap();
    for sentiment in Sentiment::ALL {
        writeln!(md, "| {} | {} |", sentiment, score.count(sentiment)).unwrap();
    }
    writeln!(md).unwrap();

    let overlap = &score.topic_overlap;
    writeln!(md, "## Topic Overlap\n").unwrap();
    writeln!(md, "- **Common topics:** {}", topic_list(&overlap.common_topics)).unwrap();
    writeln!(md, "- **Unique to article 1:** {}", topic_list(&overlap.unique_topics_in_article_1)).unwrap();
    writeln!(md, "- **Unique to article 2:** {}\n", topic_list(&overlap.unique_topics_in_article_2)).unwrap();

    writeln!(md, "## Coverage Differences\n").unwrap();
    for diff in &score.coverage_differences {
        writeln!(md, "{}\n", diff.comparison).unwrap();
        writeln!(md, "**Impact:** {}\n", diff.impact).unwrap();
    }

    if !result.articles.is_empty() {
        writeln!(md, "## Articles\n").unwrap();
    }
    for (i, article) in result.articles.iter().enumerate() {
        writeln!(
            md,
            "### <a id=\"{}\"></a>{}. [{}]({})\n",
            slugify(&article.title),
            i + 1,
            article.title,
            article.url
        )
        .unwrap();
        let topics = if article.topics.is_empty() {
            "_none_".to_string()
        } else {
            article.topics.join(", ")
        };
        writeln!(md, "*Sentiment:* {} · *Topics:* {}\n", article.sentiment, topics).unwrap();
        writeln!(md, "{}\n", article.summary).unwrap();
    }

    if !result.fallbacks.is_empty() {
        writeln!(md, "## Fallbacks\n").unwrap();
        for note in &result.fallbacks {
            match note.article {
                Some(i) => writeln!(md, "- `{}` (article {}): {}", note.stage, i + 1, note.reason).unwrap(),
                None => writeln!(md, "- `{}`: {}", note.stage, note.reason).unwrap(),
            }
        }
    }

    md
}

/// Write the report to `{markdown_output_dir}/{company_slug}/{date}_{time_of_day}.md`.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir))]
pub async fn write_report(
    result: &AnalysisResult,
    edition: &Edition,
    markdown_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let dir = edition.company_dir(markdown_output_dir);
    fs::create_dir_all(&dir).await?;
    let path = dir.join(format!("{}.md", edition.file_stem()));
    fs::write(&path, analysis_to_markdown(result, edition)).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}
