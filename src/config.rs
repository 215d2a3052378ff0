//! Runtime configuration: endpoints, credentials, pacing and budget constants.

use std::time::Duration;

/// Minimum spacing between two generation calls.
pub const MIN_CALL_INTERVAL: Duration = Duration::from_millis(1000);
/// Default recursion limit for full-tree snapshots.
pub const DEFAULT_MAX_DEPTH: usize = 3;
/// Number of directory listings fetched concurrently per batch.
pub const TREE_BATCH_SIZE: usize = 3;
/// Delay inserted before every listing request below the tree root.
pub const TREE_REQUEST_DELAY: Duration = Duration::from_millis(150);
/// Wait before the single retry of a rate-limited listing request.
pub const TREE_RATE_LIMIT_DELAY: Duration = Duration::from_millis(3000);
/// Character budget for whole-file explanations.
pub const FILE_CHAR_BUDGET: usize = 15_000;
/// Character budget for question answering.
pub const QUESTION_CHAR_BUDGET: usize = 12_000;
/// Per-function code excerpt cap in batch prompts.
pub const FUNCTION_EXCERPT_CAP: usize = 500;
/// Attempts per model for plain generation calls.
pub const MAX_RETRIES: u32 = 3;
/// Attempts for architecture-diagram generation.
pub const DIAGRAM_ATTEMPTS: u32 = 3;
/// Branch assumed when repository metadata is unavailable.
pub const DEFAULT_BRANCH: &str = "main";
/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Base URL of the generation API; the model and method are appended.
pub const DEFAULT_GENERATION_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
/// Base URL of the source-hosting REST API.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_output_tokens: u32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
}

impl GenerationSettings {
    /// Settings for free-form explanations.
    #[must_use]
    pub fn explanation() -> Self {
        Self { temperature: 0.7, max_output_tokens: 8192, top_k: 40, top_p: 0.95 }
    }

    /// Settings for JSON architecture descriptions.
    #[must_use]
    pub fn diagram() -> Self {
        Self { temperature: 0.2, max_output_tokens: 8192, top_k: 40, top_p: 0.95 }
    }
}

/// Limits applied while walking a repository tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSettings {
    /// Depth at which recursion stops.
    pub max_depth: usize,
    /// Concurrent listings per batch.
    pub batch_size: usize,
    /// Delay before each listing below the root.
    pub request_delay: Duration,
    /// Wait before retrying a rate-limited listing.
    pub rate_limit_delay: Duration,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            batch_size: TREE_BATCH_SIZE,
            request_delay: TREE_REQUEST_DELAY,
            rate_limit_delay: TREE_RATE_LIMIT_DELAY,
        }
    }
}

/// Complete configuration for the orchestration layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainerConfig {
    /// Generation API key.
    pub api_key: Option<String>,
    /// Models tried in order until one succeeds.
    pub models: Vec<String>,
    /// Generation API base URL.
    pub generation_endpoint: String,
    /// Source-hosting API base URL.
    pub github_api: String,
    /// Attempts per model.
    pub max_retries: u32,
    /// Attempts for diagram generation.
    pub diagram_attempts: u32,
    /// Minimum spacing between generation calls.
    pub min_call_interval: Duration,
    /// Budget for file explanations.
    pub file_char_budget: usize,
    /// Budget for question answering.
    pub question_char_budget: usize,
    /// Per-function excerpt cap in batch prompts.
    pub function_excerpt_cap: usize,
    /// Tree walk limits.
    pub tree: TreeSettings,
    /// Branch assumed when metadata lookup fails.
    pub default_branch: String,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            models: vec![DEFAULT_MODEL.to_string()],
            generation_endpoint: DEFAULT_GENERATION_ENDPOINT.to_string(),
            github_api: DEFAULT_GITHUB_API.to_string(),
            max_retries: MAX_RETRIES,
            diagram_attempts: DIAGRAM_ATTEMPTS,
            min_call_interval: MIN_CALL_INTERVAL,
            file_char_budget: FILE_CHAR_BUDGET,
            question_char_budget: QUESTION_CHAR_BUDGET,
            function_excerpt_cap: FUNCTION_EXCERPT_CAP,
            tree: TreeSettings::default(),
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

impl ExplainerConfig {
    /// Builds a configuration from a key lookup function.
    ///
    /// Recognised keys: `GEMINI_API_KEY`, `EXPLAINER_MODELS` (comma
    /// separated), `EXPLAINER_GENERATION_ENDPOINT`, `EXPLAINER_GITHUB_API`.
    /// Blank values fall back to defaults.
    pub fn from_getter(mut getter: impl FnMut(&str) -> Option<String>) -> Self {
        let api_key = getter("GEMINI_API_KEY").filter(|key| !key.trim().is_empty());
        let mut config = Self { api_key, ..Self::default() };

        if let Some(models) = getter("EXPLAINER_MODELS") {
            let models: Vec<String> = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
            if !models.is_empty() {
                config.models = models;
            }
        }

        if let Some(endpoint) = sanitize_base_url(getter("EXPLAINER_GENERATION_ENDPOINT")) {
            config.generation_endpoint = endpoint;
        }
        if let Some(api) = sanitize_base_url(getter("EXPLAINER_GITHUB_API")) {
            config.github_api = api;
        }

        config
    }

    /// Loads `.env` (if present) and builds a configuration from the process
    /// environment.
    #[must_use]
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to load .env file");
            }
        }
        Self::from_getter(|key| std::env::var(key).ok())
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }
}

fn sanitize_base_url(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_named_constants() {
        let cfg = ExplainerConfig::default();
        assert_eq!(cfg.models, vec![DEFAULT_MODEL.to_string()]);
        assert_eq!(cfg.min_call_interval, Duration::from_secs(1));
        assert_eq!(cfg.tree.max_depth, 3);
        assert_eq!(cfg.tree.batch_size, 3);
        assert_eq!(cfg.file_char_budget, 15_000);
        assert_eq!(cfg.question_char_budget, 12_000);
        assert_eq!(cfg.default_branch, "main");
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn from_getter_reads_overrides() {
        let getter = |key: &str| match key {
            "GEMINI_API_KEY" => Some("secret".to_string()),
            "EXPLAINER_MODELS" => Some(" model-a, ,model-b ".to_string()),
            "EXPLAINER_GENERATION_ENDPOINT" => Some("https://llm.local/v1/".to_string()),
            "EXPLAINER_GITHUB_API" => Some("https://ghe.local/api/v3/".to_string()),
            _ => None,
        };

        let cfg = ExplainerConfig::from_getter(getter);

        assert_eq!(cfg.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.models, vec!["model-a".to_string(), "model-b".to_string()]);
        assert_eq!(cfg.generation_endpoint, "https://llm.local/v1");
        assert_eq!(cfg.github_api, "https://ghe.local/api/v3");
    }

    #[test]
    fn from_getter_ignores_blank_values() {
        let getter = |key: &str| match key {
            "GEMINI_API_KEY" => Some("  ".to_string()),
            "EXPLAINER_MODELS" => Some(" , ".to_string()),
            "EXPLAINER_GITHUB_API" => Some("/".to_string()),
            _ => None,
        };

        let cfg = ExplainerConfig::from_getter(getter);

        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.models, vec![DEFAULT_MODEL.to_string()]);
        assert_eq!(cfg.github_api, DEFAULT_GITHUB_API);
    }
}
