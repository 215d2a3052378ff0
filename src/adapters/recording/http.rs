//! Recording adapter for the `HttpClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::http::{HttpClient, HttpFuture, HttpRequest};

/// Records HTTP exchanges while delegating to an inner implementation.
pub struct RecordingHttpClient {
    inner: Arc<dyn HttpClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingHttpClient {
    /// Creates a new recording client wrapping the given implementation.
    #[must_use]
    pub fn new(inner: Arc<dyn HttpClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl HttpClient for RecordingHttpClient {
    fn send(&self, request: &HttpRequest) -> HttpFuture<'_> {
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.send(&request).await;
            record_result(&recorder, "http", "send", &censored(&request), &result);
            result
        })
    }
}

/// The request as written to disk: the query string is dropped so API keys
/// never land in a cassette.
fn censored(request: &HttpRequest) -> HttpRequest {
    let mut copy = request.clone();
    copy.url = crate::adapters::live::http::censor_query(&request.url).to_string();
    copy
}
