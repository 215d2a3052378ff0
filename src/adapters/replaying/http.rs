//! Replaying adapter for the `HttpClient` port.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::debug;

use super::{next_output, replay_result};
use crate::adapters::live::http::censor_query;
use crate::cassette::format::{Cassette, Interaction};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::http::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse};

/// Serves recorded HTTP responses from a cassette, in recording order.
///
/// Requests are not matched against the recording; the N-th call receives
/// the N-th recorded response.
pub struct ReplayingHttpClient {
    replayer: Option<Arc<Mutex<CassetteReplayer>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ReplayingHttpClient {
    /// Create a replaying client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer: Some(replayer), requests: Mutex::new(Vec::new()) }
    }

    /// Create a replaying client serving `outputs` (each `{"Ok": response}`
    /// or `{"Err": message}`) in order, without a cassette file.
    #[must_use]
    pub fn scripted(outputs: Vec<serde_json::Value>) -> Self {
        let interactions = outputs
            .into_iter()
            .zip(0u64..)
            .map(|(output, seq)| Interaction {
                seq,
                port: "http".into(),
                method: "send".into(),
                input: serde_json::Value::Null,
                output,
            })
            .collect();
        let cassette = Cassette { name: "scripted".into(), recorded_at: Utc::now(), interactions };
        Self::new(Arc::new(Mutex::new(CassetteReplayer::new(&cassette))))
    }

    /// Create a replaying client with no cassette. Panics when called.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self { replayer: None, requests: Mutex::new(Vec::new()) }
    }

    /// Requests received so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }
}

impl HttpClient for ReplayingHttpClient {
    fn send(&self, request: &HttpRequest) -> HttpFuture<'_> {
        debug!(url = %censor_query(&request.url), "replaying request");
        self.requests.lock().expect("request log poisoned").push(request.clone());
        let output = next_output(self.replayer.as_ref(), "http", "send");
        Box::pin(async move { replay_result::<HttpResponse, HttpError>(output) })
    }
}
