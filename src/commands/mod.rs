//! Command dispatch and handlers.

pub mod browse;
pub mod diagram;
pub mod explain;

use std::env;
use std::path::Path;

use crate::cassette::session::RecordingSession;
use crate::cli::Command;
use crate::config::ExplainerConfig;
use crate::context::ServiceContext;
use crate::github::fetcher::ContentFetcher;
use crate::github::{parse_repo_url, FileEntry};

/// Environment variable naming a directory to record HTTP cassettes into.
pub const RECORD_ENV: &str = "EXPLAINER_RECORD";
/// Environment variable naming a cassette file to replay instead of the
/// network.
pub const REPLAY_ENV: &str = "EXPLAINER_REPLAY";

/// Dispatch a parsed command to its handler.
///
/// Configuration comes from the environment (and `.env`). When
/// `EXPLAINER_REPLAY` names a cassette, every HTTP exchange is served from
/// it under simulated time. When `EXPLAINER_RECORD` names a directory, every
/// exchange is recorded to a cassette there.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub async fn dispatch(command: &Command) -> Result<(), String> {
    let config = ExplainerConfig::from_env();

    if let Ok(path) = env::var(REPLAY_ENV) {
        let ctx = ServiceContext::replaying(Path::new(&path))?;
        let key = config.api_key.clone().or_else(|| Some("replay".to_string()));
        return dispatch_with_context(command, &ctx, &config.with_api_key(key)).await;
    }

    let (ctx, session) = if let Ok(path) = env::var(RECORD_ENV) {
        let (ctx, session) = ServiceContext::recording(Path::new(&path))?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(), None)
    };

    let result = dispatch_with_context(command, &ctx, &config).await;

    // Finish recording after command completes (even on error)
    if let Some(session) = session {
        // Drop context first to release Arc references
        drop(ctx);
        finish_recording(session)?;
    }

    result
}

/// Dispatch a command with the given service context and configuration.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub async fn dispatch_with_context(
    command: &Command,
    ctx: &ServiceContext,
    config: &ExplainerConfig,
) -> Result<(), String> {
    match command {
        Command::Snapshot { url } => browse::snapshot(ctx, config, url).await,
        Command::Ls { url, path } => browse::list(ctx, config, url, path).await,
        Command::Tree { url, path, depth } => {
            browse::tree(ctx, config, url, path, depth.unwrap_or(config.tree.max_depth)).await
        }
        Command::ExplainRepo { url } => explain::repository(ctx, config, url).await,
        Command::ExplainDir { url, path } => explain::directory(ctx, config, url, path).await,
        Command::ExplainFile { url, path, question } => {
            explain::file(ctx, config, url, path, question.as_deref()).await
        }
        Command::Functions { url, path, explain, name } => {
            explain::functions(ctx, config, url, path, *explain, name.as_deref()).await
        }
        Command::Diagram { url } => diagram::run(ctx, config, url).await,
    }
}

/// Finish a recording session and print the output directory.
fn finish_recording(session: RecordingSession) -> Result<(), String> {
    let output_dir = session.finish()?;
    eprintln!("Recording saved to: {}", output_dir.display());
    Ok(())
}

/// Fails early when generation is requested without a key.
fn require_api_key(config: &ExplainerConfig) -> Result<(), String> {
    if config.api_key.is_none() {
        return Err("GEMINI_API_KEY is not set. Export it or add it to a .env file.".to_string());
    }
    Ok(())
}

fn repo_coordinates(url: &str) -> Result<(String, String), String> {
    parse_repo_url(url).map_err(|e| e.to_string())
}

/// Finds the listing entry for `path` by listing its parent directory.
async fn find_entry(
    fetcher: &ContentFetcher,
    owner: &str,
    repo: &str,
    path: &str,
) -> Result<FileEntry, String> {
    let path = path.trim_matches('/');
    let parent = path.rsplit_once('/').map_or("", |(parent, _)| parent);
    let entries = fetcher.fetch_directory(owner, repo, parent).await.map_err(|e| e.to_string())?;
    entries
        .into_iter()
        .find(|entry| entry.path == path)
        .ok_or_else(|| format!("No such path in {owner}/{repo}: {path}"))
}

/// Downloads the text of the file at `path`.
async fn read_file(
    fetcher: &ContentFetcher,
    owner: &str,
    repo: &str,
    path: &str,
) -> Result<String, String> {
    let entry = find_entry(fetcher, owner, repo, path).await?;
    if entry.is_dir() {
        return Err(format!("{} is a directory", entry.path));
    }
    let url = entry
        .download_url
        .ok_or_else(|| format!("{} has no download URL", entry.path))?;
    fetcher.fetch_file_text(&url).await.map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_reported() {
        let err = require_api_key(&ExplainerConfig::default()).unwrap_err();
        assert!(err.contains("GEMINI_API_KEY"));
        let config = ExplainerConfig::default().with_api_key(Some("k".into()));
        assert!(require_api_key(&config).is_ok());
    }

    #[test]
    fn coordinates_come_from_url() {
        assert_eq!(
            repo_coordinates("github.com/octo/demo.git").unwrap(),
            ("octo".to_string(), "demo".to_string())
        );
        assert!(repo_coordinates("gitlab.com/octo/demo").is_err());
    }
}
