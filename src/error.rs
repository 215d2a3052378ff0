//! Error taxonomy for the content and generation boundaries.

use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by repository content fetching.
///
/// These propagate to the caller; each message is fit for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The repository URL did not match `host/<owner>/<repo>`.
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidUrl(String),
    /// The listing endpoint answered 404.
    #[error("Repository not found: {owner}/{repo}")]
    RepoNotFound {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
    },
    /// The listing endpoint refused the request because of quota.
    #[error("GitHub API rate limit exceeded while fetching {0}. Please wait and try again.")]
    RateLimited(String),
    /// Any other non-success response or transport failure.
    #[error("Failed to fetch {target}: {reason}")]
    FetchFailed {
        /// What was being fetched (path or URL).
        target: String,
        /// Status text or transport message.
        reason: String,
    },
    /// The response body did not have the expected shape.
    #[error("Unexpected response for {target}: {reason}")]
    MalformedResponse {
        /// What was being fetched.
        target: String,
        /// What was wrong with the body.
        reason: String,
    },
}

impl FetchError {
    pub(crate) fn fetch_failed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FetchFailed { target: target.into(), reason: reason.into() }
    }

    pub(crate) fn malformed(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse { target: target.into(), reason: reason.into() }
    }
}

/// Why a single generation attempt failed.
///
/// Reasons are carried forward across retries so the final fallback message
/// can name the specific cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    /// HTTP 429, with the server's `Retry-After` when present.
    #[error("rate limit exceeded (HTTP 429)")]
    RateLimited {
        /// Server-provided wait.
        retry_after: Option<Duration>,
    },
    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Error message extracted from the body, or the raw body.
        message: String,
    },
    /// A successful status whose body carried an `error` field.
    #[error("API error: {0}")]
    ApiError(String),
    /// Generation stopped by the safety filter.
    #[error("response blocked by safety filters")]
    SafetyBlocked,
    /// Generation stopped because output recited protected material.
    #[error("response blocked for recitation")]
    RecitationBlocked,
    /// The token limit was hit before any text was produced.
    #[error("response truncated at the output token limit")]
    TruncatedOutput,
    /// Generation stopped for some other reason without text.
    #[error("generation stopped: {0}")]
    OtherStop(String),
    /// No candidates (or no text in them) were returned.
    #[error("no candidates returned")]
    EmptyCandidates,
    /// The body was not the expected JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// The request never produced a response.
    #[error("transport error: {0}")]
    TransportError(String),
}

impl GenerationFailure {
    /// Returns `true` for quota failures.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Content blocks repeat deterministically, so the same model is not
    /// asked again; everything else is retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::SafetyBlocked | Self::RecitationBlocked)
    }
}

/// Failures surfaced by architecture-diagram generation.
///
/// Unlike plain explanations, diagram requests do not fall back to a
/// success-shaped result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagramError {
    /// The architecture description was not usable.
    #[error("Invalid diagram data: {0}")]
    InvalidDiagramData(String),
    /// Still rate limited after the final attempt.
    #[error(
        "Rate limit exceeded while generating the architecture diagram. \
         Please wait a minute and try again."
    )]
    RateLimited,
    /// Every attempt failed.
    #[error("Failed to generate architecture diagram after {attempts} attempts: {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// Description of the last failure.
        last: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_errors_render_for_display() {
        let err = FetchError::RepoNotFound { owner: "octo".into(), repo: "demo".into() };
        assert_eq!(err.to_string(), "Repository not found: octo/demo");

        let err = FetchError::fetch_failed("lib", "500 Internal Server Error");
        assert_eq!(err.to_string(), "Failed to fetch lib: 500 Internal Server Error");
    }

    #[test]
    fn content_blocks_are_not_retried() {
        assert!(!GenerationFailure::SafetyBlocked.is_retryable());
        assert!(!GenerationFailure::RecitationBlocked.is_retryable());
        assert!(GenerationFailure::EmptyCandidates.is_retryable());
        assert!(GenerationFailure::RateLimited { retry_after: None }.is_retryable());
        assert!(GenerationFailure::RateLimited { retry_after: None }.is_rate_limit());
        assert!(!GenerationFailure::TransportError("reset".into()).is_rate_limit());
    }
}
