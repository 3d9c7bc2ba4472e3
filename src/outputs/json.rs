//! JSON output of the analysis document.
//!
//! The document has the same shape as the `/news?company=` endpoint
//! response, so existing dashboards can read it unchanged.

use super::Edition;
use crate::models::AnalysisResult;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `result` to `{json_output_dir}/{company_slug}/{date}_{time_of_day}.json`.
///
/// # Errors
///
/// Returns an error if serialization, directory creation or the write fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_analysis(
    result: &AnalysisResult,
    edition: &Edition,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(result)?;

    let dir = edition.company_dir(json_output_dir);
    info!(dir = %dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = dir.join(format!("{}.json", edition.file_stem()));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON analysis file");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparativeAnalysis, ComparativeSentimentScore, TopicOverlap};
    use std::collections::BTreeMap;

    fn empty_result(company: &str) -> AnalysisResult {
        AnalysisResult {
            company: company.to_string(),
            generated_at: "2025-05-06T20:30:00Z".to_string(),
            articles: vec![],
            comparative: ComparativeAnalysis {
                sentiment_score: ComparativeSentimentScore {
                    distribution: BTreeMap::new(),
                    coverage_differences: vec![],
                    topic_overlap: TopicOverlap::default(),
                },
                final_sentiment_narrative: "Nothing to report.".to_string(),
                final_sentiment_audio_path: None,
            },
            fallbacks: vec![],
        }
    }

    #[tokio::test]
    async fn test_write_analysis_round_trips() {
        let base = std::env::temp_dir().join(format!("acn_json_{}", std::process::id()));
        let base_str = base.to_str().unwrap();
        let edition = Edition::new("Tesla", "2025-05-06", "evening");
        let result = empty_result("Tesla");

        let path = write_analysis(&result, &edition, base_str).await.unwrap();
        assert!(path.ends_with("tesla/2025-05-06_evening.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: AnalysisResult = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, result);
        assert!(written.contains("\"Comparative Analysis\""));

        let _ = std::fs::remove_dir_all(&base);
    }
}
