//! # Awful Company News
//!
//! Fetches recent news about one company, scrapes each article, asks an
//! OpenAI-compatible LLM for a summary, sentiment and topics per article, and
//! aggregates everything into a comparative analysis with an optional
//! translated audio summary.
//!
//! ## Usage
//!
//! ```sh
//! awful_company_news Tesla -j ./json -m ./markdown
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: NewsAPI (or Google News RSS) search for the company
//! 2. **Extraction**: Download each article page and pull out its main text
//! 3. **Enrichment**: Summary, sentiment and topics per article (bounded parallelism)
//! 4. **Aggregation**: Sentiment distribution, topic overlap, narrative comparison, final verdict
//! 5. **Audio**: Translate the verdict and synthesize speech
//! 6. **Output**: JSON (or YAML) document, Markdown report, per-company index
//!
//! Every LLM call falls back to a labeled default on failure; only a failed
//! news search aborts the run.

use awful_aj::{config, config_dir, template};
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod aggregator;
mod api;
mod audio;
mod cli;
mod comparator;
mod enrich;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod topics;
mod utils;

use api::{AwfulJadeClient, RetryGenerate};
use cli::{Cli, OutputFormat, SourceArg};
use outputs::{indexes, json, markdown, yaml, Edition};
use pipeline::{Analyzer, AudioOptions, PipelineOptions};
use scrapers::NewsSource;
use utils::ensure_writable_dir;

/// Pick the news source from the CLI flags.
fn resolve_source(source: SourceArg, newsapi_key: Option<&str>) -> Result<NewsSource, Box<dyn Error>> {
    let key = newsapi_key.map(str::trim).filter(|k| !k.is_empty());
    match (source, key) {
        (SourceArg::GoogleNews, _) => Ok(NewsSource::GoogleNews),
        (SourceArg::Newsapi | SourceArg::Auto, Some(key)) => Ok(NewsSource::NewsApi {
            api_key: key.to_string(),
        }),
        (SourceArg::Newsapi, None) => Err("--source newsapi requires --newsapi-key or NEWSAPI_KEY".into()),
        (SourceArg::Auto, None) => {
            warn!("No NewsAPI key configured; falling back to Google News RSS");
            Ok(NewsSource::GoogleNews)
        }
    }
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "awful_company_news starting up");

    let args = Cli::parse();
    debug!(?args.json_output_dir, ?args.markdown_output_dir, source = ?args.source, "Parsed CLI arguments");

    let source = resolve_source(args.source, args.newsapi_key.as_deref())?;

    // Fail on unwritable output dirs before spending any requests.
    let mut output_dirs = vec![args.json_output_dir.as_str()];
    output_dirs.extend(args.markdown_output_dir.as_deref());
    if !args.no_audio {
        output_dirs.push(args.audio_output_dir.as_str());
    }
    for dir in output_dirs {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Output directory is not writable (fix perms or choose a different path)");
            return Err(e);
        }
    }

    // ---- Load LLM config & template ----
    let config_path = match &args.config {
        Some(path) => PathBuf::from(path),
        None => config_dir()?.join("config.yaml"),
    };
    let config_path = config_path.to_str().ok_or("Not a valid config filename")?;
    let config = config::load_config(config_path)?;
    info!(config_path, "Loaded configuration");
    let template = template::load_template(&args.template).await?;
    info!(template = %args.template, "Loaded template");

    let generator = RetryGenerate::new(
        AwfulJadeClient::new(config, template),
        args.max_retries,
        Duration::from_secs(1),
    );
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.http_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let analyzer = Analyzer {
        http: &http,
        generator: &generator,
        source: &source,
        options: PipelineOptions {
            max_articles: args.max_articles,
            concurrency: usize::from(args.concurrency),
            audio: (!args.no_audio).then(|| AudioOptions {
                language: args.audio_language.clone(),
                output_dir: PathBuf::from(&args.audio_output_dir),
            }),
        },
    };

    // ---- Analyze ----
    let result = analyzer.analyze(&args.company).await?;
    if !result.fallbacks.is_empty() {
        warn!(count = result.fallbacks.len(), "Some LLM calls fell back to defaults");
    }

    // ---- Output ----
    let edition = Edition::now(&result.company);
    let document_path = match args.format {
        OutputFormat::Json => json::write_analysis(&result, &edition, &args.json_output_dir).await,
        OutputFormat::Yaml => yaml::write_analysis(&result, &edition, &args.json_output_dir).await,
    };
    let document_path = match document_path {
        Ok(path) => path,
        Err(e) => {
            error!(error = %e, "Failed to write analysis document");
            return Err(e);
        }
    };

    if let Some(markdown_dir) = &args.markdown_output_dir {
        match markdown::write_report(&result, &edition, markdown_dir).await {
            Ok(_) => {
                let markdown_filename = format!("{}.md", edition.file_stem());
                if let Err(e) = indexes::update_company_index(markdown_dir, &edition, &markdown_filename).await {
                    error!(error = %e, "Failed to update company index");
                }
            }
            Err(e) => error!(error = %e, "Failed writing Markdown report"),
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        articles = result.articles.len(),
        document = %document_path.display(),
        "Execution complete"
    );

    Ok(())
}
