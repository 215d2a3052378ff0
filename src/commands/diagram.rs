//! `diagram` command.

use crate::config::ExplainerConfig;
use crate::context::ServiceContext;

use super::require_api_key;

/// Execute the `diagram` command, printing Mermaid source.
///
/// # Errors
///
/// Returns an error string if no API key is configured, the repository
/// cannot be walked, or diagram generation fails.
pub async fn run(ctx: &ServiceContext, config: &ExplainerConfig, url: &str) -> Result<(), String> {
    require_api_key(config)?;
    let fetcher = ctx.fetcher(config);
    let snapshot = fetcher.fetch_root_listing(url).await.map_err(|e| e.to_string())?;
    let tree = fetcher.fetch_snapshot_tree(&snapshot).await.map_err(|e| e.to_string())?;

    let mermaid = ctx
        .explainer(config)
        .generate_architecture_diagram(&snapshot, &tree)
        .await
        .map_err(|e| e.to_string())?;
    print!("{mermaid}");
    Ok(())
}
