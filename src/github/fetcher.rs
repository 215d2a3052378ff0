//! Contents API client: listings, raw files, and bounded full-tree walks.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{parse_repo_url, EntryKind, FileEntry, RepoSnapshot, TreeNode};
use crate::config::{ExplainerConfig, TreeSettings};
use crate::error::FetchError;
use crate::ports::clock::Clock;
use crate::ports::http::{HttpClient, HttpRequest, HttpResponse};

const ACCEPT: &str = "application/vnd.github.v3+json";

/// Listing item as returned by the contents API.
#[derive(Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    sha: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Repository metadata; only the default branch is used.
#[derive(Deserialize)]
struct RepoMetadata {
    default_branch: Option<String>,
}

/// Fetches repository listings and file contents.
///
/// Content calls are not paced by the generation rate limiter; only the
/// full-tree walk spaces its own requests.
pub struct ContentFetcher {
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    api_base: String,
    tree: TreeSettings,
    default_branch: String,
}

impl ContentFetcher {
    /// Creates a fetcher using the API base, tree limits and fallback branch
    /// from `config`.
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>, config: &ExplainerConfig) -> Self {
        Self {
            http,
            clock,
            api_base: config.github_api.clone(),
            tree: config.tree.clone(),
            default_branch: config.default_branch.clone(),
        }
    }

    /// Tree limits in effect.
    #[must_use]
    pub fn tree_settings(&self) -> &TreeSettings {
        &self.tree
    }

    /// Loads the root listing of the repository at `url`.
    ///
    /// The default branch comes from a second metadata request whose failure
    /// is not fatal.
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` is not a repository URL
    /// - [`FetchError::RepoNotFound`] on 404
    /// - [`FetchError::RateLimited`] on 403/429
    /// - [`FetchError::FetchFailed`] on other failures
    /// - [`FetchError::MalformedResponse`] if the listing is not an array
    pub async fn fetch_root_listing(&self, url: &str) -> Result<RepoSnapshot, FetchError> {
        let (owner, repo) = parse_repo_url(url)?;
        let target = format!("{owner}/{repo}");

        let response = self.get(&self.contents_url(&owner, &repo, ""), &target).await?;
        match response.status {
            404 => return Err(FetchError::RepoNotFound { owner, repo }),
            403 | 429 => return Err(FetchError::RateLimited(target)),
            _ if !response.is_success() => {
                return Err(FetchError::fetch_failed(target, status_text(response.status)));
            }
            _ => {}
        }
        let files = decode_listing(&response.body, "", &target)?;
        let default_branch = self.fetch_default_branch(&owner, &repo).await;

        info!(%owner, %repo, entries = files.len(), %default_branch, "loaded repository");
        Ok(RepoSnapshot { name: repo, owner, path: String::new(), default_branch, files })
    }

    /// Lists one directory.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::FetchFailed`] on any non-success response and
    /// [`FetchError::MalformedResponse`] if the body is not a listing.
    pub async fn fetch_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<FileEntry>, FetchError> {
        let response = self.get(&self.contents_url(owner, repo, path), path).await?;
        if !response.is_success() {
            return Err(FetchError::fetch_failed(path, status_text(response.status)));
        }
        decode_listing(&response.body, path, path)
    }

    /// Downloads raw file text.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::FetchFailed`] on any non-success response.
    pub async fn fetch_file_text(&self, download_url: &str) -> Result<String, FetchError> {
        let request = HttpRequest::get(download_url);
        let response = self
            .http
            .send(&request)
            .await
            .map_err(|e| FetchError::fetch_failed(download_url, e.message))?;
        if !response.is_success() {
            return Err(FetchError::fetch_failed(download_url, status_text(response.status)));
        }
        Ok(response.body)
    }

    /// Walks the tree rooted at the snapshot's repository using the
    /// configured depth limit.
    ///
    /// # Errors
    ///
    /// See [`ContentFetcher::fetch_full_tree`].
    pub async fn fetch_snapshot_tree(
        &self,
        snapshot: &RepoSnapshot,
    ) -> Result<TreeNode, FetchError> {
        let depth = self.tree.max_depth;
        self.fetch_full_tree(&snapshot.owner, &snapshot.name, &snapshot.path, depth, 0).await
    }

    /// Recursively lists `path` down to `max_depth`.
    ///
    /// At `current_depth >= max_depth` a childless directory node is returned
    /// without a request. Subdirectories are fetched in batches of
    /// `batch_size` (concurrent within a batch, batches in sequence), and
    /// every listing below the root waits `request_delay` first. A
    /// rate-limited listing is retried once after `rate_limit_delay`.
    ///
    /// # Errors
    ///
    /// Any failing subtree fails the whole walk:
    /// [`FetchError::RateLimited`] after the retry,
    /// [`FetchError::FetchFailed`] for other statuses and
    /// [`FetchError::MalformedResponse`] for non-array bodies.
    pub fn fetch_full_tree<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        path: &'a str,
        max_depth: usize,
        current_depth: usize,
    ) -> BoxFuture<'a, Result<TreeNode, FetchError>> {
        Box::pin(async move {
            let name = path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or(repo);
            let mut node = TreeNode::dir(name, path);
            if current_depth >= max_depth {
                return Ok(node);
            }
            if current_depth > 0 {
                self.clock.sleep(self.tree.request_delay).await;
            }

            let entries = self.list_for_tree(owner, repo, path).await?;
            node.children = entries.iter().map(TreeNode::leaf).collect();

            let dir_indices: Vec<usize> = node
                .children
                .iter()
                .enumerate()
                .filter(|(_, child)| child.kind == EntryKind::Dir)
                .map(|(i, _)| i)
                .collect();

            for batch in dir_indices.chunks(self.tree.batch_size.max(1)) {
                let subtrees = try_join_all(batch.iter().map(|&i| {
                    let child_path = node.children[i].path.clone();
                    async move {
                        self.fetch_full_tree(owner, repo, &child_path, max_depth, current_depth + 1)
                            .await
                    }
                }))
                .await?;
                for (&i, subtree) in batch.iter().zip(subtrees) {
                    node.children[i] = subtree;
                }
            }

            Ok(node)
        })
    }

    async fn list_for_tree(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<FileEntry>, FetchError> {
        let url = self.contents_url(owner, repo, path);
        let target = if path.is_empty() { repo } else { path };

        let mut response = self.get(&url, target).await?;
        if is_rate_limited(&response) {
            let delay = self.tree.rate_limit_delay;
            warn!(path = target, ?delay, "listing rate limited, retrying once");
            self.clock.sleep(delay).await;
            response = self.get(&url, target).await?;
            if is_rate_limited(&response) {
                return Err(FetchError::RateLimited(target.to_string()));
            }
        }
        if !response.is_success() {
            return Err(FetchError::fetch_failed(target, status_text(response.status)));
        }
        decode_listing(&response.body, path, target)
    }

    async fn fetch_default_branch(&self, owner: &str, repo: &str) -> String {
        let url = format!("{}/repos/{owner}/{repo}", self.api_base);
        let branch = match self.get(&url, repo).await {
            Ok(response) if response.is_success() => {
                serde_json::from_str::<RepoMetadata>(&response.body)
                    .ok()
                    .and_then(|meta| meta.default_branch)
                    .filter(|b| !b.is_empty())
            }
            Ok(response) => {
                debug!(status = response.status, "repository metadata unavailable");
                None
            }
            Err(e) => {
                debug!(error = %e, "repository metadata request failed");
                None
            }
        };
        branch.unwrap_or_else(|| self.default_branch.clone())
    }

    async fn get(&self, url: &str, target: &str) -> Result<HttpResponse, FetchError> {
        let request = HttpRequest::get(url).header("accept", ACCEPT);
        self.http.send(&request).await.map_err(|e| FetchError::fetch_failed(target, e.message))
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        let base = format!("{}/repos/{owner}/{repo}/contents", self.api_base);
        let path = path.trim_matches('/');
        if path.is_empty() {
            base
        } else {
            format!("{base}/{path}")
        }
    }
}

fn is_rate_limited(response: &HttpResponse) -> bool {
    matches!(response.status, 403 | 429)
}

/// `"<code> <reason>"` for display, e.g. `"500 Internal Server Error"`.
fn status_text(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map_or_else(|| status.to_string(), |reason| format!("{status} {reason}"))
}

/// Decodes a listing body, checking every path sits below `parent`.
fn decode_listing(body: &str, parent: &str, target: &str) -> Result<Vec<FileEntry>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::malformed(target, format!("invalid JSON: {e}")))?;
    if !value.is_array() {
        return Err(FetchError::malformed(target, "expected a directory listing array"));
    }
    let items: Vec<ContentItem> = serde_json::from_value(value)
        .map_err(|e| FetchError::malformed(target, format!("invalid listing entry: {e}")))?;

    let parent = parent.trim_matches('/');
    items
        .into_iter()
        .map(|item| {
            if !parent.is_empty() && !item.path.starts_with(&format!("{parent}/")) {
                return Err(FetchError::malformed(
                    target,
                    format!("entry {} is outside {parent}", item.path),
                ));
            }
            let kind = if item.kind == "dir" { EntryKind::Dir } else { EntryKind::File };
            Ok(FileEntry {
                name: item.name,
                path: item.path,
                kind,
                size: item.size,
                download_url: item.download_url,
                content_hash: item.sha,
                api_url: item.url,
            })
        })
        .collect()
}
