//! Generation API request and response shapes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::GenerationSettings;
use crate::error::GenerationFailure;
use crate::ports::http::HttpResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_k: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

impl<'a> GenerateRequest<'a> {
    pub(crate) fn new(prompt: &'a str, settings: &GenerationSettings, json_only: bool) -> Self {
        Self {
            contents: vec![Content { parts: vec![Part { text: prompt }] }],
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                max_output_tokens: settings.max_output_tokens,
                top_k: settings.top_k,
                top_p: settings.top_p,
                response_mime_type: json_only.then_some("application/json"),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiErrorBody,
}

/// Turns one HTTP exchange into generated text or a specific failure.
///
/// Success needs a 2xx status, no `error` field and non-empty text.
pub(crate) fn classify(response: &HttpResponse) -> Result<String, GenerationFailure> {
    if response.status == 429 {
        return Err(GenerationFailure::RateLimited { retry_after: retry_after(response) });
    }
    if !response.is_success() {
        let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| crate::truncate::cap(response.body.trim(), 300));
        return Err(GenerationFailure::HttpStatus { status: response.status, message });
    }

    let parsed: GenerateResponse = serde_json::from_str(&response.body)
        .map_err(|e| GenerationFailure::MalformedResponse(e.to_string()))?;

    if let Some(error) = parsed.error {
        if error.status.as_deref() == Some("RESOURCE_EXHAUSTED") {
            return Err(GenerationFailure::RateLimited { retry_after: None });
        }
        return Err(GenerationFailure::ApiError(error.message));
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let blocked = parsed.prompt_feedback.and_then(|f| f.block_reason).is_some();
        return Err(if blocked {
            GenerationFailure::SafetyBlocked
        } else {
            GenerationFailure::EmptyCandidates
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if !text.trim().is_empty() {
        return Ok(text);
    }

    Err(match candidate.finish_reason.as_deref() {
        Some("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII") => {
            GenerationFailure::SafetyBlocked
        }
        Some("RECITATION") => GenerationFailure::RecitationBlocked,
        Some("MAX_TOKENS") => GenerationFailure::TruncatedOutput,
        Some(reason) if reason != "STOP" => GenerationFailure::OtherStop(reason.to_string()),
        _ => GenerationFailure::EmptyCandidates,
    })
}

/// Parses `Retry-After` given in (possibly fractional) seconds.
fn retry_after(response: &HttpResponse) -> Option<Duration> {
    let value = response.header("retry-after")?.trim();
    let seconds: f64 = value.parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn response(status: u16, body: &serde_json::Value) -> HttpResponse {
        HttpResponse { status, headers: BTreeMap::new(), body: body.to_string() }
    }

    fn finished(reason: &str) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": []}, "finishReason": reason}]})
    }

    #[test]
    fn request_uses_camel_case_and_optional_json_mode() {
        let settings = GenerationSettings::explanation();
        let plain = serde_json::to_value(GenerateRequest::new("hi", &settings, false)).unwrap();
        assert_eq!(plain["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(plain["generationConfig"]["maxOutputTokens"], 8192);
        assert_eq!(plain["generationConfig"]["topK"], 40);
        assert!(plain["generationConfig"].get("responseMimeType").is_none());

        let json_mode = serde_json::to_value(GenerateRequest::new("hi", &settings, true)).unwrap();
        assert_eq!(json_mode["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn joins_text_parts() {
        let body = json!({"candidates": [{
            "content": {"parts": [{"text": "Hello "}, {"text": "world"}]},
            "finishReason": "STOP"
        }]});
        assert_eq!(classify(&response(200, &body)).unwrap(), "Hello world");
    }

    #[test]
    fn text_wins_over_max_tokens() {
        let body = json!({"candidates": [{
            "content": {"parts": [{"text": "partial"}]},
            "finishReason": "MAX_TOKENS"
        }]});
        assert_eq!(classify(&response(200, &body)).unwrap(), "partial");
    }

    #[test]
    fn classifies_stop_reasons_without_text() {
        let cases = [
            ("SAFETY", GenerationFailure::SafetyBlocked),
            ("RECITATION", GenerationFailure::RecitationBlocked),
            ("MAX_TOKENS", GenerationFailure::TruncatedOutput),
            ("OTHER", GenerationFailure::OtherStop("OTHER".into())),
            ("STOP", GenerationFailure::EmptyCandidates),
        ];
        for (reason, expected) in cases {
            assert_eq!(classify(&response(200, &finished(reason))).unwrap_err(), expected);
        }
    }

    #[test]
    fn classifies_missing_candidates() {
        let empty = json!({"candidates": []});
        assert_eq!(
            classify(&response(200, &empty)).unwrap_err(),
            GenerationFailure::EmptyCandidates
        );

        let blocked = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(
            classify(&response(200, &blocked)).unwrap_err(),
            GenerationFailure::SafetyBlocked
        );
    }

    #[test]
    fn error_field_fails_even_with_ok_status() {
        let body = json!({"error": {"message": "API key not valid", "status": "INVALID_ARGUMENT"}});
        assert_eq!(
            classify(&response(200, &body)).unwrap_err(),
            GenerationFailure::ApiError("API key not valid".into())
        );

        let quota = json!({"error": {"message": "quota", "status": "RESOURCE_EXHAUSTED"}});
        assert!(classify(&response(200, &quota)).unwrap_err().is_rate_limit());
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let mut headers = BTreeMap::new();
        headers.insert("retry-after".to_string(), "5".to_string());
        let limited = HttpResponse { status: 429, headers, body: String::new() };

        assert_eq!(
            classify(&limited).unwrap_err(),
            GenerationFailure::RateLimited { retry_after: Some(Duration::from_secs(5)) }
        );
    }

    #[test]
    fn unusable_retry_after_is_ignored() {
        for value in ["1e20", "soon", "-3", "NaN"] {
            let mut headers = BTreeMap::new();
            headers.insert("retry-after".to_string(), value.to_string());
            let limited = HttpResponse { status: 429, headers, body: String::new() };

            assert_eq!(
                classify(&limited).unwrap_err(),
                GenerationFailure::RateLimited { retry_after: None },
                "retry-after: {value}"
            );
        }
    }

    #[test]
    fn http_errors_carry_api_message() {
        let body = json!({"error": {"code": 400, "message": "bad request body"}});
        assert_eq!(
            classify(&response(400, &body)).unwrap_err(),
            GenerationFailure::HttpStatus { status: 400, message: "bad request body".into() }
        );

        let raw = HttpResponse { status: 503, headers: BTreeMap::new(), body: "upstream".into() };
        assert_eq!(
            classify(&raw).unwrap_err(),
            GenerationFailure::HttpStatus { status: 503, message: "upstream".into() }
        );
    }

    #[test]
    fn invalid_json_is_malformed() {
        let raw = HttpResponse { status: 200, headers: BTreeMap::new(), body: "<html>".into() };
        assert!(matches!(classify(&raw), Err(GenerationFailure::MalformedResponse(_))));
    }
}
