//! Utility functions for text trimming, edition naming, and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Word-based truncation of article text before it is sent to the model
//! - Time classification for naming report files
//! - String truncation and slugification for logging and file names
//! - File system validation for output directories

use chrono::{Local, NaiveTime, Timelike};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Keep at most `max_words` whitespace-separated words of `text`, joined by single spaces.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classify a time of day into morning, afternoon, or evening.
///
/// The time boundaries are:
/// - **Morning**: 00:00 - 08:00
/// - **Afternoon**: 08:00 - 16:00
/// - **Evening**: 16:00 - 24:00
pub fn edition_for(tod: NaiveTime) -> &'static str {
    match tod.hour() {
        0..=7 => "morning",
        8..=15 => "afternoon",
        _ => "evening",
    }
}

/// Edition name for the current local time. See [`edition_for`].
#[instrument]
pub fn time_of_day() -> String {
    let tod = Local::now().time();
    let which = edition_for(tod);
    tracing::debug!(%tod, %which, "Computed time_of_day");
    which.to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and byte count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Convert a company name or title to a file-name-friendly slug.
///
/// Lowercases, drops everything except alphanumerics, spaces and hyphens, and
/// joins the remaining words with single hyphens.
///
/// ```ignore
/// assert_eq!(slugify("Procter & Gamble"), "procter-gamble");
/// ```
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .split(|c: char| c == ' ' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and immediately deletes a
/// probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("one  two\nthree four", 3), "one two three");
        assert_eq!(truncate_words("short", 500), "short");
        assert_eq!(truncate_words("", 10), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "नमस्ते दुनिया";
        let result = truncate_for_log(s, 4);
        assert!(result.contains("bytes)"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Tesla"), "tesla");
        assert_eq!(slugify("Procter & Gamble"), "procter-gamble");
        assert_eq!(slugify("  Alpha-Beta  Corp!"), "alpha-beta-corp");
    }

    #[test]
    fn test_upcase() {
        assert_eq!(upcase("morning"), "Morning");
        assert_eq!(upcase(""), "");
    }

    #[test]
    fn test_edition_boundaries() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        assert_eq!(edition_for(t(0, 0)), "morning");
        assert_eq!(edition_for(t(7, 59)), "morning");
        assert_eq!(edition_for(t(8, 0)), "afternoon");
        assert_eq!(edition_for(t(15, 59)), "afternoon");
        assert_eq!(edition_for(t(16, 0)), "evening");
        assert_eq!(edition_for(t(23, 59)), "evening");
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = std::env::temp_dir().join(format!("acn_writable_{}", std::process::id()));
        let path = dir.to_str().unwrap().to_string();
        ensure_writable_dir(&path).await.unwrap();
        assert!(dir.is_dir());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
