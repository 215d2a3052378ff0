//! End-to-end scenarios through the public API with scripted HTTP and
//! simulated time.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use repo_explainer::adapters::replaying::ReplayingHttpClient;
use repo_explainer::adapters::simulated::SimulatedClock;
use repo_explainer::config::ExplainerConfig;
use repo_explainer::context::ServiceContext;
use repo_explainer::github::EntryKind;

fn ok(status: u16, body: &serde_json::Value) -> serde_json::Value {
    json!({"Ok": {"status": status, "headers": {}, "body": body.to_string()}})
}

fn generated(text: &str) -> serde_json::Value {
    let payload = json!({
        "candidates": [{"content": {"parts": [{"text": text}]}, "finishReason": "STOP"}]
    });
    ok(200, &payload)
}

fn context(
    outputs: Vec<serde_json::Value>,
) -> (ServiceContext, Arc<ReplayingHttpClient>, Arc<SimulatedClock>) {
    let http = Arc::new(ReplayingHttpClient::scripted(outputs));
    let clock = Arc::new(SimulatedClock::default());
    (ServiceContext::from_parts(http.clone(), clock.clone()), http, clock)
}

fn config() -> ExplainerConfig {
    ExplainerConfig::default().with_api_key(Some("test-key".into()))
}

#[tokio::test]
async fn loads_repository_snapshot() {
    let (ctx, http, _) = context(vec![
        ok(200, &json!([
            {"name": "a.ts", "path": "a.ts", "type": "file"},
            {"name": "lib", "path": "lib", "type": "dir"}
        ])),
        ok(200, &json!({"default_branch": "main"})),
    ]);

    let snapshot =
        ctx.fetcher(&config()).fetch_root_listing("https://github.com/octo/demo").await.unwrap();

    assert_eq!(snapshot.owner, "octo");
    assert_eq!(snapshot.name, "demo");
    assert_eq!(snapshot.files.len(), 2);
    assert_eq!(snapshot.files[1].kind, EntryKind::Dir);
    assert_eq!(http.requests()[0].url, "https://api.github.com/repos/octo/demo/contents");
}

#[tokio::test]
async fn persistent_rate_limit_yields_free_tier_message() {
    let limited = json!({"Ok": {"status": 429, "headers": {"retry-after": "5"}, "body": ""}});
    let (ctx, http, clock) = context(vec![limited.clone(), limited.clone(), limited]);

    let explanation =
        ctx.explainer(&config()).explain_file("octo/demo", "a.ts", "let a = 1;").await;

    assert!(explanation.content.contains("free-tier rate limit"));
    assert!(explanation.content.contains("wait"));
    assert!(explanation.code_snippets.is_empty());
    assert_eq!(http.requests().len(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(5), Duration::from_secs(5)]);
}

#[tokio::test]
async fn code_fences_become_snippets() {
    let text = "Setup:\n```bash\nnpm install\n```\nThen:\n```ts\nrun();\n```\n";
    let (ctx, _, _) = context(vec![generated(text)]);

    let explanation = ctx.explainer(&config()).explain_file("octo/demo", "a.ts", "run();").await;

    assert_eq!(explanation.code_snippets.len(), 2);
    for snippet in &explanation.code_snippets {
        assert!(snippet.starts_with("```") && snippet.ends_with("```"));
    }
}

#[tokio::test]
async fn shallow_tree_does_not_list_subdirectories() {
    let (ctx, http, _) = context(vec![ok(200, &json!([
        {"name": "src", "path": "src", "type": "dir"},
        {"name": "docs", "path": "docs", "type": "dir"},
        {"name": "README.md", "path": "README.md", "type": "file"}
    ]))]);

    let tree = ctx.fetcher(&config()).fetch_full_tree("octo", "demo", "", 1, 0).await.unwrap();

    assert_eq!(tree.children.len(), 3);
    assert!(tree.children.iter().all(|c| c.children.is_empty()));
    assert_eq!(http.requests().len(), 1);
}

#[tokio::test]
async fn diagram_drops_edges_to_undeclared_components() {
    let description = json!({
        "modules": [{"id": "web", "label": "Web", "components": [{"id": "ui", "label": "UI"}]}],
        "relationships": [{"from": "ui", "to": "missing", "kind": "solid"}]
    });
    let (ctx, _, _) = context(vec![
        ok(200, &json!([{"name": "index.html", "path": "index.html", "type": "file"}])),
        ok(200, &json!({"default_branch": "main"})),
        ok(200, &json!([{"name": "index.html", "path": "index.html", "type": "file"}])),
        generated(&description.to_string()),
    ]);
    let config = config();
    let fetcher = ctx.fetcher(&config);
    let snapshot = fetcher.fetch_root_listing("https://github.com/octo/demo").await.unwrap();
    let tree = fetcher.fetch_snapshot_tree(&snapshot).await.unwrap();

    let mermaid =
        ctx.explainer(&config).generate_architecture_diagram(&snapshot, &tree).await.unwrap();

    assert!(mermaid.contains("ui[\"UI\"]"));
    assert!(!mermaid.contains("missing"));
    assert!(!mermaid.contains("-->"));
}
