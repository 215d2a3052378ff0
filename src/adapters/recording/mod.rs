//! Recording adapters that capture interactions to cassettes.

pub mod http;

use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

pub use http::RecordingHttpClient;

/// Record a `Result<T, E>` interaction using the Ok/Err JSON convention.
///
/// Mirror of `replaying::replay_result`:
/// - `Ok(v)` is serialized as `{"Ok": v}`
/// - `Err(e)` is serialized as `{"Err": e.to_string()}`
///
/// Values that fail to serialize are recorded as `null` and logged.
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let input_json = serde_json::to_value(input).unwrap_or_else(|e| {
        tracing::warn!(port, method, error = %e, "failed to serialize recording input");
        serde_json::Value::Null
    });

    let output_json = match result {
        Ok(v) => {
            let inner = serde_json::to_value(v).unwrap_or(serde_json::Value::Null);
            serde_json::json!({ "Ok": inner })
        }
        Err(e) => serde_json::json!({ "Err": e.to_string() }),
    };

    match recorder.lock() {
        Ok(mut guard) => guard.record(port, method, input_json, output_json),
        Err(e) => tracing::warn!(port, method, error = %e, "recorder lock poisoned"),
    }
}
