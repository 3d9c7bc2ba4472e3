//! Command-line interface definitions.
//!
//! All options can be given as flags; credentials can also come from the
//! environment.
//!
//! # Examples
//!
//! ```sh
//! # NewsAPI search, Hindi audio summary next to the JSON
//! NEWSAPI_KEY=... awful_company_news Tesla -j ./json -m ./markdown
//!
//! # No API key: Google News RSS, no audio
//! awful_company_news "Procter & Gamble" -j ./json --source google-news --no-audio
//! ```

use clap::{Parser, ValueEnum};

/// Where to look for articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// NewsAPI when a key is configured, Google News otherwise.
    Auto,
    Newsapi,
    GoogleNews,
}

/// Serialization of the analysis document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Company to search news for
    pub company: String,

    /// Output directory for the analysis document
    #[arg(short, long)]
    pub json_output_dir: String,

    /// Output directory for the Markdown report (no report when omitted)
    #[arg(short, long)]
    pub markdown_output_dir: Option<String>,

    /// Format of the analysis document
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Optional path to the awful_aj config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Name of the awful_aj chat template used for every prompt
    #[arg(long, default_value = "company_news")]
    pub template: String,

    /// News source
    #[arg(long, value_enum, default_value_t = SourceArg::Auto)]
    pub source: SourceArg,

    /// NewsAPI key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// Maximum number of articles to analyze
    #[arg(long, default_value_t = 10)]
    pub max_articles: usize,

    /// Maximum concurrent page downloads and article enrichments
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Retries per LLM call before falling back (0 = single attempt)
    #[arg(long, default_value_t = 0)]
    pub max_retries: usize,

    /// Timeout in seconds for news, page, translation and speech requests
    #[arg(long, default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Skip the translated audio summary
    #[arg(long)]
    pub no_audio: bool,

    /// Target language of the audio summary
    #[arg(long, default_value = "hi")]
    pub audio_language: String,

    /// Directory for generated audio files
    #[arg(long, default_value = ".")]
    pub audio_output_dir: String,
}
