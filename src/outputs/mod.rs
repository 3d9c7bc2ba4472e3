//! Output generation for the analysis document, Markdown report and index.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`AnalysisResult`](crate::models::AnalysisResult) as JSON
//! - [`yaml`]: Writes the same document as YAML
//! - [`markdown`]: Renders a human-readable report
//! - [`indexes`]: Maintains the per-company list of reports
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── tesla/
//!     ├── 2025-05-06_morning.json
//!     └── 2025-05-06_evening.json
//!
//! markdown_output_dir/
//! └── tesla/
//!     ├── index.md                # Every report for the company
//!     └── 2025-05-06_morning.md
//! ```

pub mod indexes;
pub mod json;
pub mod markdown;
pub mod yaml;

use crate::utils::{slugify, time_of_day};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Names the files produced by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edition {
    /// Company name as given on the command line.
    pub company: String,
    /// Directory name derived from the company.
    pub company_slug: String,
    /// `YYYY-MM-DD`.
    pub local_date: String,
    /// "morning", "afternoon" or "evening".
    pub time_of_day: String,
}

impl Edition {
    /// Edition for `company` at the current local time.
    pub fn now(company: &str) -> Self {
        Self::new(company, &Local::now().date_naive().to_string(), &time_of_day())
    }

    pub fn new(company: &str, local_date: &str, time_of_day: &str) -> Self {
        let slug = slugify(company);
        Self {
            company: company.trim().to_string(),
            company_slug: if slug.is_empty() { "company".to_string() } else { slug },
            local_date: local_date.to_string(),
            time_of_day: time_of_day.to_string(),
        }
    }

    /// File name without extension, e.g. `2025-05-06_morning`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.local_date, self.time_of_day)
    }

    /// `{base}/{company_slug}`.
    pub fn company_dir(&self, base: &str) -> PathBuf {
        Path::new(base).join(&self.company_slug)
    }
}
