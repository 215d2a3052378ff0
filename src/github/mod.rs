//! Repository content model and the source-hosting API fetcher.
//!
//! [`ContentFetcher`] turns the contents API into typed snapshots:
//!
//! ```text
//! fetch_root_listing(url)      -> RepoSnapshot   (listing + default branch)
//! fetch_directory(o, r, path)  -> [FileEntry]    (one level, on demand)
//! fetch_file_text(url)         -> String         (raw download)
//! fetch_full_tree(o, r, ...)   -> TreeNode       (depth-bounded, batched)
//! ```

pub mod fetcher;

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

pub use fetcher::ContentFetcher;

static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
        .unwrap_or_else(|e| panic!("invalid repository URL pattern: {e}"))
});

/// Whether an entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file (symlinks and submodules are reported as files).
    File,
    /// Directory whose children are fetched on demand.
    Dir,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Entry name.
    pub name: String,
    /// Path from the repository root; unique within a repository.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Raw download URL for files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// Git blob hash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    /// API URL of the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl FileEntry {
    /// Returns `true` for directories.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Root listing of a repository, captured once per load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoSnapshot {
    /// Repository name.
    pub name: String,
    /// Repository owner.
    pub owner: String,
    /// Path the listing was taken at (empty for the root).
    pub path: String,
    /// Default branch, or the configured fallback.
    pub default_branch: String,
    /// Root entries in listing order.
    pub files: Vec<FileEntry>,
}

/// A node of a depth-bounded repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Node name.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Path from the repository root.
    pub path: String,
    /// Size in bytes for files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Children; empty for files and for directories beyond the depth limit.
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// A directory node with no children.
    #[must_use]
    pub fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Dir,
            path: path.into(),
            size: None,
            children: Vec::new(),
        }
    }

    /// A childless node mirroring a listing entry.
    #[must_use]
    pub fn leaf(entry: &FileEntry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: entry.kind,
            path: entry.path.clone(),
            size: entry.size,
            children: Vec::new(),
        }
    }

    /// Total number of nodes below this one.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children.iter().map(|c| 1 + c.descendant_count()).sum()
    }

    /// Renders an indented outline, directories suffixed with `/`.
    #[must_use]
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        let suffix = if self.kind == EntryKind::Dir { "/" } else { "" };
        let _ = writeln!(out, "{}{}{suffix}", "  ".repeat(depth), self.name);
        for child in &self.children {
            child.write_outline(out, depth + 1);
        }
    }
}

/// Extracts `(owner, repo)` from a repository URL.
///
/// Accepts `https://github.com/<owner>/<repo>` with or without scheme, with
/// a trailing `.git`, extra path segments, query or fragment.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when the pattern does not match.
pub fn parse_repo_url(url: &str) -> Result<(String, String), FetchError> {
    let captures =
        REPO_URL.captures(url.trim()).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;
    let owner = captures[1].to_string();
    let repo = captures[2].trim_end_matches(".git").to_string();
    if repo.is_empty() {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    Ok((owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decorated_urls() {
        let expected = ("octo".to_string(), "demo".to_string());
        assert_eq!(parse_repo_url("https://github.com/octo/demo").unwrap(), expected);
        assert_eq!(parse_repo_url("github.com/octo/demo.git").unwrap(), expected);
        assert_eq!(parse_repo_url("https://github.com/octo/demo/tree/main/src").unwrap(), expected);
        assert_eq!(parse_repo_url("https://github.com/octo/demo?tab=readme").unwrap(), expected);
        assert_eq!(parse_repo_url("  https://www.github.com/octo/demo#top ").unwrap(), expected);
    }

    #[test]
    fn rejects_urls_without_owner_and_repo() {
        for url in ["https://gitlab.com/octo/demo", "https://github.com/octo", "demo", ""] {
            assert!(
                matches!(parse_repo_url(url), Err(FetchError::InvalidUrl(_))),
                "expected InvalidUrl for {url:?}"
            );
        }
    }

    #[test]
    fn outline_indents_children() {
        let mut root = TreeNode::dir("demo", "");
        let mut lib = TreeNode::dir("lib", "lib");
        lib.children.push(TreeNode {
            name: "util.ts".into(),
            kind: EntryKind::File,
            path: "lib/util.ts".into(),
            size: Some(10),
            children: Vec::new(),
        });
        root.children.push(lib);

        assert_eq!(root.outline(), "demo/\n  lib/\n    util.ts\n");
        assert_eq!(root.descendant_count(), 2);
    }
}
