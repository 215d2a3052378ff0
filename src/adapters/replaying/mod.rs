//! Replaying adapters that replay recorded interactions.

pub mod http;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

pub use http::ReplayingHttpClient;

/// Pull the next recorded output for `port::method`.
///
/// Mirror of `recording::record_result`.
///
/// # Panics
///
/// Panics if no replayer is configured or the cassette is exhausted.
pub(crate) fn next_output(
    replayer: Option<&Arc<Mutex<CassetteReplayer>>>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let replayer = replayer.unwrap_or_else(|| {
        panic!("{port} port not configured for replay: no cassette loaded for {port}")
    });
    let mut guard = replayer.lock().expect("replayer lock poisoned");
    guard.next_interaction(port, method).output
}

/// Decode an `{"Ok": v}` / `{"Err": msg}` output into a `Result`.
///
/// # Panics
///
/// Panics if the recorded value matches neither shape or `v` does not
/// deserialize into `T`.
pub(crate) fn replay_result<T, E>(output: serde_json::Value) -> Result<T, E>
where
    T: DeserializeOwned,
    E: From<String>,
{
    if let Some(ok) = output.get("Ok") {
        let value = serde_json::from_value(ok.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize recorded Ok value: {e}"));
        return Ok(value);
    }
    if let Some(err) = output.get("Err") {
        let message = err.as_str().map_or_else(|| err.to_string(), String::from);
        return Err(E::from(message));
    }
    panic!("recorded output is neither Ok nor Err: {output}");
}
