//! `snapshot`, `ls` and `tree` commands.

use crate::config::ExplainerConfig;
use crate::context::ServiceContext;
use crate::github::FileEntry;

use super::repo_coordinates;

/// Execute the `snapshot` command.
///
/// # Errors
///
/// Returns an error string if the repository cannot be loaded.
pub async fn snapshot(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
) -> Result<(), String> {
    let fetcher = ctx.fetcher(config);
    let snapshot = fetcher.fetch_root_listing(url).await.map_err(|e| e.to_string())?;

    println!("Repository: {}/{}", snapshot.owner, snapshot.name);
    println!("Default branch: {}", snapshot.default_branch);
    println!();
    print_entries(&snapshot.files);
    Ok(())
}

/// Execute the `ls` command.
///
/// # Errors
///
/// Returns an error string if the URL is invalid or the listing fails.
pub async fn list(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
    path: &str,
) -> Result<(), String> {
    let (owner, repo) = repo_coordinates(url)?;
    let fetcher = ctx.fetcher(config);
    let entries = fetcher
        .fetch_directory(&owner, &repo, path.trim_matches('/'))
        .await
        .map_err(|e| e.to_string())?;

    if entries.is_empty() {
        println!("{path} is empty.");
    } else {
        print_entries(&entries);
    }
    Ok(())
}

/// Execute the `tree` command.
///
/// # Errors
///
/// Returns an error string if the URL is invalid or any listing fails.
pub async fn tree(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
    path: &str,
    depth: usize,
) -> Result<(), String> {
    let (owner, repo) = repo_coordinates(url)?;
    let fetcher = ctx.fetcher(config);
    let tree = fetcher
        .fetch_full_tree(&owner, &repo, path.trim_matches('/'), depth, 0)
        .await
        .map_err(|e| e.to_string())?;

    print!("{}", tree.outline());
    println!("\n{} entries (depth limit {depth})", tree.descendant_count());
    Ok(())
}

fn print_entries(entries: &[FileEntry]) {
    for entry in entries {
        if entry.is_dir() {
            println!("  {}/", entry.name);
        } else {
            let size = entry.size.map_or_else(String::new, |s| format!("  ({s} bytes)"));
            println!("  {}{size}", entry.name);
        }
    }
}
