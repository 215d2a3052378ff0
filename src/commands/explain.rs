//! `explain-repo`, `explain-dir`, `explain-file` and `functions` commands.

use tracing::warn;

use crate::config::ExplainerConfig;
use crate::context::ServiceContext;
use crate::functions::extract_functions;
use crate::llm::Explanation;

use super::{read_file, repo_coordinates, require_api_key};

/// Execute the `explain-repo` command.
///
/// The README is included when the root has one; failing to download it is
/// not fatal.
///
/// # Errors
///
/// Returns an error string if no API key is configured or the repository
/// cannot be walked.
pub async fn repository(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
) -> Result<(), String> {
    require_api_key(config)?;
    let fetcher = ctx.fetcher(config);
    let snapshot = fetcher.fetch_root_listing(url).await.map_err(|e| e.to_string())?;
    let tree = fetcher.fetch_snapshot_tree(&snapshot).await.map_err(|e| e.to_string())?;

    let readme_url = snapshot
        .files
        .iter()
        .find(|f| !f.is_dir() && f.name.to_ascii_lowercase().starts_with("readme"))
        .and_then(|f| f.download_url.clone());
    let readme = match readme_url {
        Some(url) => match fetcher.fetch_file_text(&url).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "README unavailable, explaining without it");
                None
            }
        },
        None => None,
    };

    let explainer = ctx.explainer(config);
    print_explanation(&explainer.explain_repository(&snapshot, &tree, readme.as_deref()).await);
    Ok(())
}

/// Execute the `explain-dir` command.
///
/// # Errors
///
/// Returns an error string if no API key is configured or the listing fails.
pub async fn directory(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
    path: &str,
) -> Result<(), String> {
    require_api_key(config)?;
    let (owner, repo) = repo_coordinates(url)?;
    let path = path.trim_matches('/');
    let entries = ctx
        .fetcher(config)
        .fetch_directory(&owner, &repo, path)
        .await
        .map_err(|e| e.to_string())?;

    let explainer = ctx.explainer(config);
    let repo_name = format!("{owner}/{repo}");
    print_explanation(&explainer.explain_directory(&repo_name, path, &entries).await);
    Ok(())
}

/// Execute the `explain-file` command.
///
/// # Errors
///
/// Returns an error string if no API key is configured or the file cannot
/// be downloaded.
pub async fn file(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
    path: &str,
    question: Option<&str>,
) -> Result<(), String> {
    require_api_key(config)?;
    let (owner, repo) = repo_coordinates(url)?;
    let content = read_file(&ctx.fetcher(config), &owner, &repo, path).await?;

    let explainer = ctx.explainer(config);
    let repo_name = format!("{owner}/{repo}");
    let explanation = match question {
        Some(question) => explainer.answer_question(&repo_name, path, &content, question).await,
        None => explainer.explain_file(&repo_name, path, &content).await,
    };
    print_explanation(&explanation);
    Ok(())
}

/// Execute the `functions` command.
///
/// Without flags, lists the functions found. `--explain` explains all of
/// them in one request; `--name` explains one in detail.
///
/// # Errors
///
/// Returns an error string if the file cannot be downloaded, a requested
/// function does not exist, or generation is requested without an API key.
pub async fn functions(
    ctx: &ServiceContext,
    config: &ExplainerConfig,
    url: &str,
    path: &str,
    explain: bool,
    name: Option<&str>,
) -> Result<(), String> {
    if explain || name.is_some() {
        require_api_key(config)?;
    }
    let (owner, repo) = repo_coordinates(url)?;
    let content = read_file(&ctx.fetcher(config), &owner, &repo, path).await?;
    let found = extract_functions(path, &content);

    if let Some(name) = name {
        let function = found
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| format!("No function named {name} in {path}"))?;
        let explainer = ctx.explainer(config);
        print_explanation(&explainer.explain_function(path, function).await);
        return Ok(());
    }

    if found.is_empty() {
        println!("No functions found in {path}.");
        return Ok(());
    }

    if explain {
        let explainer = ctx.explainer(config);
        for item in explainer.explain_functions(path, &found).await {
            println!("{} (line {}): {}", item.name, item.line, item.explanation);
        }
    } else {
        for function in &found {
            println!("{} (line {})", function.name, function.line);
        }
    }
    Ok(())
}

fn print_explanation(explanation: &Explanation) {
    println!("{}", explanation.content.trim_end());
    if !explanation.code_snippets.is_empty() {
        eprintln!("\n({} code snippet(s) in this explanation)", explanation.code_snippets.len());
    }
}
