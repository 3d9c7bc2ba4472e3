//! YAML output of the analysis document, for `--format yaml`.

use super::Edition;
use crate::models::AnalysisResult;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

/// Write `result` to `{output_dir}/{company_slug}/{date}_{time_of_day}.yaml`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_analysis(
    result: &AnalysisResult,
    edition: &Edition,
    output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let yaml = serde_yaml::to_string(result)?;

    let dir = edition.company_dir(output_dir);
    fs::create_dir_all(&dir).await?;
    let path = dir.join(format!("{}.yaml", edition.file_stem()));
    fs::write(&path, yaml).await?;
    info!(path = %path.display(), "Wrote YAML analysis file");
    Ok(path)
}
