//! Service context bundling the port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapters::live::{LiveClock, LiveHttpClient};
use crate::adapters::recording::http::RecordingHttpClient;
use crate::adapters::replaying::ReplayingHttpClient;
use crate::adapters::simulated::SimulatedClock;
use crate::cassette::format::Cassette;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::session::RecordingSession;
use crate::config::ExplainerConfig;
use crate::explain::Explainer;
use crate::github::fetcher::ContentFetcher;
use crate::llm::{GenerationClient, RateLimiter};
use crate::ports::clock::Clock;
use crate::ports::http::HttpClient;

/// Bundles the port trait objects every service is built from.
///
/// Constructors wire up different adapter implementations (live, recording,
/// replaying).
pub struct ServiceContext {
    /// HTTP transport for both the content and generation APIs.
    pub http: Arc<dyn HttpClient>,
    /// Clock for pacing, backoff and tree delays.
    pub clock: Arc<dyn Clock>,
}

impl ServiceContext {
    /// Creates a live context backed by reqwest and the system clock.
    #[must_use]
    pub fn live() -> Self {
        Self::from_parts(Arc::new(LiveHttpClient::new()), Arc::new(LiveClock))
    }

    /// Creates a recording context that captures every HTTP exchange.
    ///
    /// Live adapters do the actual work. The cassette is written when the
    /// returned [`RecordingSession`] is finished, after this context (and
    /// everything built from it) has been dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the session directory cannot be created.
    pub fn recording(base: &Path) -> Result<(Self, RecordingSession), String> {
        let session = RecordingSession::new(base)?;
        let http =
            RecordingHttpClient::new(Arc::new(LiveHttpClient::new()), Arc::clone(&session.http));
        Ok((Self::from_parts(Arc::new(http), Arc::new(LiveClock)), session))
    }

    /// Creates a replaying context from an HTTP cassette file.
    ///
    /// Time is simulated, so recorded backoff and pacing waits cost nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, String> {
        let cassette = Cassette::load(path)?;
        let replayer = Arc::new(Mutex::new(CassetteReplayer::new(&cassette)));
        Ok(Self::from_parts(
            Arc::new(ReplayingHttpClient::new(replayer)),
            Arc::new(SimulatedClock::default()),
        ))
    }

    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn from_parts(http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        Self { http, clock }
    }

    /// Content fetcher over this context's transport.
    #[must_use]
    pub fn fetcher(&self, config: &ExplainerConfig) -> ContentFetcher {
        ContentFetcher::new(Arc::clone(&self.http), Arc::clone(&self.clock), config)
    }

    /// Explainer with its own rate limiter.
    ///
    /// Build one per process; every generation request made through it
    /// shares the limiter.
    #[must_use]
    pub fn explainer(&self, config: &ExplainerConfig) -> Explainer {
        let limiter = Arc::new(RateLimiter::new(Arc::clone(&self.clock), config.min_call_interval));
        let llm =
            GenerationClient::new(Arc::clone(&self.http), Arc::clone(&self.clock), limiter, config);
        Explainer::new(llm, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::Interaction;
    use chrono::Utc;
    use serde_json::json;

    use crate::ports::http::HttpRequest;

    #[tokio::test]
    async fn replaying_context_serves_cassette() {
        let dir = std::env::temp_dir().join("explainer_ctx_replay_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("http.cassette.yaml");
        let cassette = Cassette {
            name: "ctx".into(),
            recorded_at: Utc::now(),
            interactions: vec![Interaction {
                seq: 0,
                port: "http".into(),
                method: "send".into(),
                input: json!({"method": "GET", "url": "https://api.github.com/repos/octo/demo"}),
                output: json!({"Ok": {"status": 200, "headers": {}, "body": "{}"}}),
            }],
        };
        std::fs::write(&path, serde_yaml::to_string(&cassette).unwrap()).unwrap();

        let ctx = ServiceContext::replaying(&path).unwrap();
        let response =
            ctx.http.send(&HttpRequest::get("https://api.github.com/repos/octo/demo")).await;

        assert_eq!(response.unwrap().status, 200);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn replaying_missing_file_is_an_error() {
        let result = ServiceContext::replaying(Path::new("/nonexistent/http.cassette.yaml"));
        assert!(result.is_err());
    }
}
