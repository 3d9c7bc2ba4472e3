//! Per-company report index.
//!
//! `{markdown_output_dir}/{company_slug}/index.md` lists every report written
//! for the company, grouped by date, newest date first:
//!
//! ```text
//! # Tesla News Reports
//!
//! - [**2025-05-06**]
//!     - [Morning](./2025-05-06_morning.md)
//!     - [Evening](./2025-05-06_evening.md)
//! ```
//!
//! Re-running the same edition does not add a duplicate entry.

use super::Edition;
use crate::utils::upcase;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Insert `edition`'s entry into an existing index text (or a fresh one when `existing` is `None`).
pub fn insert_entry(existing: Option<&str>, edition: &Edition, markdown_filename: &str) -> String {
    let header = format!("# {} News Reports", edition.company);
    let content = existing.map(str::to_string).unwrap_or_else(|| format!("{header}\n"));

    let date_heading = format!("- [**{}**]", edition.local_date);
    let edition_entry = format!(
        "    - [{}](./{})",
        upcase(&edition.time_of_day),
        markdown_filename
    );

    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();

    if let Some(i) = lines.iter().position(|l| l.trim() == date_heading.trim()) {
        let mut j = i + 1;
        let mut found_edition = false;
        while j < lines.len() && lines[j].starts_with("    - ") {
            if lines[j].trim() == edition_entry.trim() {
                found_edition = true;
                break;
            }
            j += 1;
        }
        if !found_edition {
            lines.insert(j, edition_entry);
        }
    } else if let Some(pos) = lines.iter().position(|l| l.starts_with("# ")) {
        let insert_at = pos + 1;
        lines.insert(insert_at, String::new());
        lines.insert(insert_at + 1, date_heading);
        lines.insert(insert_at + 2, edition_entry);
    } else {
        lines.push(date_heading);
        lines.push(edition_entry);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Add `edition` to the company's `index.md`, creating the file if needed.
#[instrument(level = "info", skip_all, fields(%markdown_output_dir, company = %edition.company_slug, file = %markdown_filename))]
pub async fn update_company_index(
    markdown_output_dir: &str,
    edition: &Edition,
    markdown_filename: &str,
) -> Result<(), Box<dyn Error>> {
    let dir = edition.company_dir(markdown_output_dir);
    fs::create_dir_all(&dir).await?;
    let index_path = dir.join("index.md");

    let existing = if Path::new(&index_path).exists() {
        Some(fs::read_to_string(&index_path).await?)
    } else {
        None
    };

    let updated = insert_entry(existing.as_deref(), edition, markdown_filename);
    fs::write(&index_path, updated).await?;
    info!(path = %index_path.display(), "Updated company index");
    Ok(())
}
