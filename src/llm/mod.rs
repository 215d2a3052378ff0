//! Generation API client: pacing, model fallback, retries and result
//! normalization.

pub mod client;
pub mod rate_limit;
mod wire;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use client::{Exhausted, GenerationClient};
pub use rate_limit::RateLimiter;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```.*?```").unwrap_or_else(|e| panic!("invalid code fence pattern: {e}"))
});

/// Normalized result of any generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    /// Generated (or fallback) text.
    pub content: String,
    /// Fenced code blocks found in `content`, fences included.
    pub code_snippets: Vec<String>,
}

impl Explanation {
    /// Wraps generated text, extracting its code blocks.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        let content = content.into();
        let code_snippets = extract_code_blocks(&content);
        Self { content, code_snippets }
    }
}

/// Returns every triple-backtick block in `text`, in order.
///
/// Each block runs from an opening fence to the nearest closing fence;
/// blocks never overlap. An unmatched trailing fence is ignored.
#[must_use]
pub fn extract_code_blocks(text: &str) -> Vec<String> {
    CODE_FENCE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_each_fenced_block() {
        let text = "Intro\n```rust\nfn a() {}\n```\nmiddle\n```\nplain\n```\nend";
        let blocks = extract_code_blocks(text);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], "```rust\nfn a() {}\n```");
        assert_eq!(blocks[1], "```\nplain\n```");
        for block in &blocks {
            assert!(block.starts_with("```") && block.ends_with("```"));
        }
    }

    #[test]
    fn unmatched_fence_is_ignored() {
        assert!(extract_code_blocks("no code here").is_empty());
        assert!(extract_code_blocks("```js\nlet a = 1;").is_empty());
    }

    #[test]
    fn explanation_serializes_in_camel_case() {
        let explanation = Explanation::from_text("see ```x```");
        let value = serde_json::to_value(&explanation).unwrap();
        assert_eq!(value["codeSnippets"][0], "```x```");
    }
}
