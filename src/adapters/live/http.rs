//! Live adapter for the `HttpClient` port backed by reqwest.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::ports::http::{HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse};

const USER_AGENT: &str = concat!("repo-explainer/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Live HTTP client that performs real network requests.
pub struct LiveHttpClient {
    client: Client,
}

impl LiveHttpClient {
    /// Creates a new live HTTP client.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

impl Default for LiveHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for LiveHttpClient {
    fn send(&self, request: &HttpRequest) -> HttpFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            debug!(method = ?request.method, url = %censor_query(&request.url), "sending request");

            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| HttpError::new(format!("request failed: {}", e.without_url())))?;

            let status = response.status().as_u16();
            let headers: BTreeMap<String, String> = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
                })
                .collect();
            let body = response.text().await.map_err(|e| {
                HttpError::new(format!("failed to read response body: {}", e.without_url()))
            })?;

            Ok(HttpResponse { status, headers, body })
        })
    }
}

/// Strips the query string so API keys passed as parameters never reach logs.
pub(crate) fn censor_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}
