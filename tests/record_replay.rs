//! Record-replay round-trip integration test.
//!
//! 1. Record a session through `RecordingHttpClient` (the inner client is
//!    scripted, so no network is needed).
//! 2. Replay the written cassette using `ServiceContext::replaying()`.
//! 3. Assert identical outputs between recording and replaying.
//! 4. Replay a second time and assert determinism.

use std::sync::{Arc, Mutex};

use serde_json::json;

use repo_explainer::adapters::recording::http::RecordingHttpClient;
use repo_explainer::adapters::replaying::ReplayingHttpClient;
use repo_explainer::adapters::simulated::SimulatedClock;
use repo_explainer::cassette::recorder::CassetteRecorder;
use repo_explainer::config::ExplainerConfig;
use repo_explainer::context::ServiceContext;

fn ok(body: &serde_json::Value) -> serde_json::Value {
    json!({"Ok": {"status": 200, "headers": {}, "body": body.to_string()}})
}

fn config() -> ExplainerConfig {
    ExplainerConfig::default().with_api_key(Some("secret-key".into()))
}

/// Loads a snapshot and explains its root directory.
async fn exercise(ctx: &ServiceContext) -> (Vec<String>, String, String) {
    let config = config();
    let snapshot = ctx
        .fetcher(&config)
        .fetch_root_listing("https://github.com/octo/demo")
        .await
        .unwrap();
    let explanation =
        ctx.explainer(&config).explain_directory("octo/demo", "", &snapshot.files).await;
    let paths = snapshot.files.iter().map(|f| f.path.clone()).collect();
    (paths, snapshot.default_branch, explanation.content)
}

#[tokio::test]
async fn record_then_replay_produces_identical_outputs() {
    let dir = std::env::temp_dir().join("explainer_record_replay_test");
    std::fs::create_dir_all(&dir).unwrap();
    let cassette_path = dir.join("roundtrip.cassette.yaml");

    // --- Phase 1: Record ---
    let upstream = Arc::new(ReplayingHttpClient::scripted(vec![
        ok(&json!([
            {"name": "src", "path": "src", "type": "dir"},
            {"name": "Cargo.toml", "path": "Cargo.toml", "type": "file", "size": 300}
        ])),
        ok(&json!({"default_branch": "main"})),
        ok(&json!({
            "candidates": [{"content": {"parts": [{"text": "The root holds the crate."}]}}]
        })),
    ]));
    let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&cassette_path, "roundtrip")));
    let recording = ServiceContext::from_parts(
        Arc::new(RecordingHttpClient::new(upstream, Arc::clone(&recorder))),
        Arc::new(SimulatedClock::default()),
    );
    let recorded = exercise(&recording).await;
    drop(recording);

    let recorder = Arc::try_unwrap(recorder).ok().unwrap().into_inner().unwrap();
    assert_eq!(recorder.len(), 3);
    let written = recorder.finish().expect("recording should succeed");
    assert_eq!(written, cassette_path);

    let yaml = std::fs::read_to_string(&cassette_path).unwrap();
    assert!(!yaml.contains("secret-key"), "API key must not be written to cassettes");

    assert_eq!(recorded.0, vec!["src".to_string(), "Cargo.toml".to_string()]);
    assert_eq!(recorded.1, "main");
    assert_eq!(recorded.2, "The root holds the crate.");

    // --- Phase 2: Replay and verify identical outputs ---
    let replay1 = ServiceContext::replaying(&cassette_path).unwrap();
    let first = exercise(&replay1).await;
    assert_eq!(first, recorded, "replay mismatch");

    // --- Phase 3: Replay a second time for determinism ---
    let replay2 = ServiceContext::replaying(&cassette_path).unwrap();
    let second = exercise(&replay2).await;
    assert_eq!(first, second, "determinism: outputs differ between replays");

    let _ = std::fs::remove_dir_all(&dir);
}
