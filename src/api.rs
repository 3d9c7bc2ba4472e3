//! LLM access: the injected generation client, optional retry, and the
//! uniform fallback wrapper every pipeline stage calls through.
//!
//! # Architecture
//!
//! - [`TextGenerator`]: Core trait defining a single-turn prompt → text call
//! - [`AwfulJadeClient`]: Owns the `awful_aj` config and chat template and implements [`TextGenerator`]
//! - [`RetryGenerate`]: Opt-in decorator that retries any [`TextGenerator`] with backoff (off by default)
//! - [`generate_or_fallback`]: Never fails; substitutes a fallback value and
//!   reports why when the underlying call errors or comes back blank
//!
//! One client is built in `main` and passed by reference to the enricher,
//! comparator and aggregator.

use crate::models::Stage;
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{rng, Rng};
use std::error::Error;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Trait for a single-turn, stateless text generation call.
///
/// Implementors receive a complete prompt and return the model's raw reply.
pub trait TextGenerator {
    /// Send `prompt` to the model and return its reply.
    async fn generate(&self, prompt: &str) -> Result<String, Box<dyn Error>>;
}

/// Upper bound on a single backoff delay, before jitter.
const MAX_BACKOFF: StdDuration = StdDuration::from_secs(30);

/// Decorator that retries a failing [`TextGenerator`] with exponential backoff.
///
/// Retry `n` waits `min(base_delay * 2^(n-1), 30s)` plus up to 250ms of
/// jitter. With `max_retries == 0` the wrapper makes exactly one attempt.
pub struct RetryGenerate<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
}

impl<T: TextGenerator> RetryGenerate<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    fn backoff(&self, retry: usize) -> StdDuration {
        let exponent = u32::try_from(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(MAX_BACKOFF)
    }
}

impl<T: TextGenerator> TextGenerator for RetryGenerate<T> {
    #[instrument(level = "debug", skip_all, fields(max_retries = self.max_retries))]
    async fn generate(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let mut retries = 0usize;
        loop {
            match self.inner.generate(prompt).await {
                Ok(reply) => return Ok(reply),
                Err(e) if retries >= self.max_retries => return Err(e),
                Err(e) => {
                    retries += 1;
                    let delay = self.backoff(retries) + StdDuration::from_millis(rng().random_range(0..=250));
                    warn!(retries, ?delay, error = %e, "generate() failed; retrying");
                    sleep(delay).await;
                }
            }
        }
    }
}

/// [`TextGenerator`] backed by `awful_aj::api::ask` against an
/// OpenAI-compatible endpoint.
#[derive(Debug)]
pub struct AwfulJadeClient {
    /// API endpoint, key and model settings.
    pub config: AwfulJadeConfig,
    /// Chat template providing the system prompt; each prompt is sent as the user message.
    pub template: ChatTemplate,
}

impl AwfulJadeClient {
    pub fn new(config: AwfulJadeConfig, template: ChatTemplate) -> Self {
        Self { config, template }
    }
}

impl TextGenerator for AwfulJadeClient {
    #[instrument(level = "debug", skip_all, fields(prompt_bytes = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(&self.config, prompt.to_string(), &self.template, None, None).await;
        let dt = t0.elapsed();

        match &res {
            Ok(reply) => debug!(elapsed_ms = dt.as_millis() as u128, reply_bytes = reply.len(), "API call succeeded"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed"),
        }
        res
    }
}

/// Outcome of [`generate_or_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// The model reply, or the fallback text.
    pub text: String,
    /// Why the fallback was used; `None` when `text` came from the model.
    pub fallback_reason: Option<String>,
}

/// Call the model once and never fail.
///
/// Errors and blank replies are logged and replaced with `fallback()`; the
/// reason is kept on the returned [`Generation`] so callers can record it.
/// Retries, if any, belong to the client (see [`RetryGenerate`]).
#[instrument(level = "debug", skip_all, fields(%stage))]
pub async fn generate_or_fallback<G, F>(generator: &G, stage: Stage, prompt: &str, fallback: F) -> Generation
where
    G: TextGenerator,
    F: FnOnce() -> String,
{
    let reason = match generator.generate(prompt).await {
        Ok(reply) if !reply.trim().is_empty() => {
            return Generation {
                text: reply,
                fallback_reason: None,
            };
        }
        Ok(_) => "model returned an empty response".to_string(),
        Err(e) => e.to_string(),
    };

    warn!(%stage, %reason, "Generation failed; using fallback");
    Generation {
        text: fallback(),
        fallback_reason: Some(reason),
    }
}
