//! Model fallback and retry loop around the generation endpoint.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::wire::{classify, GenerateRequest};
use super::{Explanation, RateLimiter};
use crate::config::{ExplainerConfig, GenerationSettings};
use crate::error::{DiagramError, GenerationFailure};
use crate::ports::clock::Clock;
use crate::ports::http::{HttpClient, HttpRequest};

/// Every configured model failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exhausted {
    /// Models tried, in order.
    pub models: Vec<String>,
    /// The failure observed last.
    pub last: GenerationFailure,
}

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "All models failed ({}). Last error: {}", self.models.join(", "), self.last)
    }
}

impl Exhausted {
    /// User-facing text standing in for an explanation.
    ///
    /// Quota failures get advice to wait instead of the raw error.
    #[must_use]
    pub fn fallback_message(&self) -> String {
        match &self.last {
            GenerationFailure::RateLimited { retry_after } => {
                let hint = retry_after.map_or_else(String::new, |d| {
                    let seconds = d.as_secs() + u64::from(d.subsec_nanos() > 0);
                    format!(" The service asked to retry after {seconds} seconds.")
                });
                format!(
                    "The Gemini API free-tier rate limit has been reached.{hint} \
                     Please wait a minute before trying again, or use an API key with a \
                     higher quota."
                )
            }
            _ => format!(
                "Unable to generate an explanation. {self}. \
                 Please check your API key and try again."
            ),
        }
    }
}

/// Talks to the generation endpoint on behalf of every explanation request.
///
/// Each logical call takes one turn from the shared [`RateLimiter`]; retries
/// and model fallbacks within that call are spaced by backoff instead.
pub struct GenerationClient {
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    limiter: Arc<RateLimiter>,
    endpoint: String,
    api_key: Option<String>,
    models: Vec<String>,
    max_retries: u32,
    diagram_attempts: u32,
}

impl GenerationClient {
    /// Creates a client with endpoint, key, models and attempt counts from
    /// `config`.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        limiter: Arc<RateLimiter>,
        config: &ExplainerConfig,
    ) -> Self {
        Self {
            http,
            clock,
            limiter,
            endpoint: config.generation_endpoint.clone(),
            api_key: config.api_key.clone(),
            models: config.models.clone(),
            max_retries: config.max_retries.max(1),
            diagram_attempts: config.diagram_attempts.max(1),
        }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generates an explanation for `prompt`.
    ///
    /// Never fails: when every model is exhausted the returned explanation
    /// carries a human-readable failure message and no snippets.
    pub async fn generate(&self, prompt: &str) -> Explanation {
        match self.try_generate(prompt, &GenerationSettings::explanation()).await {
            Ok(text) => Explanation::from_text(text),
            Err(exhausted) => {
                warn!(error = %exhausted, "returning fallback explanation");
                Explanation { content: exhausted.fallback_message(), code_snippets: Vec::new() }
            }
        }
    }

    /// Runs the model fallback loop and returns the raw generated text.
    ///
    /// Models are tried in configured order. Each gets up to `max_retries`
    /// attempts; content blocks move straight to the next model. Retries
    /// back off `2^attempt` seconds, or honor `Retry-After` on HTTP 429
    /// (`2^(attempt+2)` seconds without one).
    ///
    /// # Errors
    ///
    /// Returns [`Exhausted`] with the last failure when no model produced
    /// text.
    pub async fn try_generate(
        &self,
        prompt: &str,
        settings: &GenerationSettings,
    ) -> Result<String, Exhausted> {
        self.limiter.wait_turn().await;
        let body = request_body(prompt, settings, false);

        let mut last = GenerationFailure::EmptyCandidates;
        for (index, model) in self.models.iter().enumerate() {
            let final_model = index + 1 == self.models.len();
            for attempt in 0..self.max_retries {
                match self.attempt(model, &body).await {
                    Ok(text) => {
                        debug!(model, attempt, "generation succeeded");
                        return Ok(text);
                    }
                    Err(failure) => {
                        warn!(model, attempt, error = %failure, "generation attempt failed");
                        let retry = failure.is_retryable() && attempt + 1 < self.max_retries;
                        let delay = backoff(&failure, attempt);
                        last = failure;
                        if retry {
                            self.clock.sleep(delay).await;
                        } else {
                            if !final_model {
                                info!(model, "falling back to next model");
                            }
                            break;
                        }
                    }
                }
            }
        }

        Err(Exhausted { models: self.models.clone(), last })
    }

    /// Requests a JSON-only response for an architecture description.
    ///
    /// Uses the first configured model for a fixed number of attempts. A
    /// rate-limited attempt waits for `Retry-After` and still counts.
    ///
    /// # Errors
    ///
    /// - [`DiagramError::RateLimited`] if the final attempt was rate limited
    /// - [`DiagramError::Exhausted`] if every attempt failed otherwise
    pub async fn generate_json(&self, prompt: &str) -> Result<String, DiagramError> {
        self.limiter.wait_turn().await;
        let body = request_body(prompt, &GenerationSettings::diagram(), true);
        let Some(model) = self.models.first() else {
            return Err(DiagramError::Exhausted {
                attempts: 0,
                last: "no models configured".into(),
            });
        };

        let mut last = GenerationFailure::EmptyCandidates;
        for attempt in 0..self.diagram_attempts {
            match self.attempt(model, &body).await {
                Ok(text) => return Ok(text),
                Err(failure) => {
                    warn!(model, attempt, error = %failure, "diagram attempt failed");
                    let final_attempt = attempt + 1 == self.diagram_attempts;
                    if final_attempt {
                        if failure.is_rate_limit() {
                            return Err(DiagramError::RateLimited);
                        }
                        last = failure;
                        break;
                    }
                    self.clock.sleep(backoff(&failure, attempt)).await;
                    last = failure;
                }
            }
        }

        Err(DiagramError::Exhausted { attempts: self.diagram_attempts, last: last.to_string() })
    }

    async fn attempt(
        &self,
        model: &str,
        body: &serde_json::Value,
    ) -> Result<String, GenerationFailure> {
        let key = self.api_key.as_deref().unwrap_or_default();
        let url = format!("{}/{model}:generateContent?key={key}", self.endpoint);
        let request = HttpRequest::post_json(url, body.clone());
        let response = self
            .http
            .send(&request)
            .await
            .map_err(|e| GenerationFailure::TransportError(e.message))?;
        classify(&response)
    }
}

fn request_body(prompt: &str, settings: &GenerationSettings, json_only: bool) -> serde_json::Value {
    serde_json::to_value(GenerateRequest::new(prompt, settings, json_only))
        .unwrap_or(serde_json::Value::Null)
}

/// Wait before the retry following a failed `attempt` (0-based).
fn backoff(failure: &GenerationFailure, attempt: u32) -> Duration {
    let exponent = match failure {
        GenerationFailure::RateLimited { retry_after: Some(wait) } => return *wait,
        GenerationFailure::RateLimited { retry_after: None } => attempt + 2,
        _ => attempt,
    };
    Duration::from_millis(1000u64 << exponent.min(16))
}
