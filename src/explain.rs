//! Explanation requests as seen by a UI: build the prompt, truncate the
//! content, ask the model.

use serde::Serialize;
use tracing::info;

use crate::config::ExplainerConfig;
use crate::diagram;
use crate::error::DiagramError;
use crate::functions::FunctionSnippet;
use crate::github::{FileEntry, RepoSnapshot, TreeNode};
use crate::llm::{Explanation, GenerationClient};
use crate::prompts;
use crate::truncate::truncate;

/// Explanation of one function from a batch request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionExplanation {
    /// Function name.
    pub name: String,
    /// 1-based declaration line.
    pub line: usize,
    /// Explanation text, or [`prompts::NO_EXPLANATION`].
    pub explanation: String,
}

/// Turns repository content into explanations.
///
/// Plain explanations never fail; see [`GenerationClient::generate`].
/// Content must be fetched by the caller with
/// [`ContentFetcher`](crate::github::fetcher::ContentFetcher).
pub struct Explainer {
    llm: GenerationClient,
    file_char_budget: usize,
    question_char_budget: usize,
    function_excerpt_cap: usize,
}

impl Explainer {
    /// Wraps a generation client with the budgets from `config`.
    #[must_use]
    pub fn new(llm: GenerationClient, config: &ExplainerConfig) -> Self {
        Self {
            llm,
            file_char_budget: config.file_char_budget,
            question_char_budget: config.question_char_budget,
            function_excerpt_cap: config.function_excerpt_cap,
        }
    }

    /// The underlying generation client.
    #[must_use]
    pub fn client(&self) -> &GenerationClient {
        &self.llm
    }

    /// Overview of a repository from its tree and optional README text.
    pub async fn explain_repository(
        &self,
        snapshot: &RepoSnapshot,
        tree: &TreeNode,
        readme: Option<&str>,
    ) -> Explanation {
        let readme = readme.map(|text| truncate(text, self.file_char_budget));
        let prompt = prompts::repository_summary(snapshot, tree, readme.as_ref());
        self.llm.generate(&prompt).await
    }

    /// Purpose of a directory from its listing.
    pub async fn explain_directory(
        &self,
        repo: &str,
        path: &str,
        entries: &[FileEntry],
    ) -> Explanation {
        self.llm.generate(&prompts::directory_summary(repo, path, entries)).await
    }

    /// Explanation of a whole file.
    pub async fn explain_file(&self, repo: &str, path: &str, content: &str) -> Explanation {
        let content = truncate(content, self.file_char_budget);
        if content.truncated {
            info!(path, omitted = content.omitted, "file truncated for explanation");
        }
        self.llm.generate(&prompts::file_summary(repo, path, &content)).await
    }

    /// Answer to a question about a file.
    pub async fn answer_question(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        question: &str,
    ) -> Explanation {
        let content = truncate(content, self.question_char_budget);
        self.llm.generate(&prompts::question(repo, path, &content, question)).await
    }

    /// Explanation of a single function.
    pub async fn explain_function(&self, path: &str, function: &FunctionSnippet) -> Explanation {
        self.llm.generate(&prompts::function_summary(path, function)).await
    }

    /// Short explanations for many functions in one request.
    ///
    /// Entries the response does not cover, or every entry when generation
    /// fails, get [`prompts::NO_EXPLANATION`].
    pub async fn explain_functions(
        &self,
        path: &str,
        functions: &[FunctionSnippet],
    ) -> Vec<FunctionExplanation> {
        if functions.is_empty() {
            return Vec::new();
        }
        let prompt = prompts::function_batch(path, functions, self.function_excerpt_cap);
        let response = self.llm.generate(&prompt).await;
        let explanations = prompts::parse_function_batch(&response.content, functions.len());

        functions
            .iter()
            .zip(explanations)
            .map(|(function, explanation)| FunctionExplanation {
                name: function.name.clone(),
                line: function.line,
                explanation,
            })
            .collect()
    }

    /// Mermaid source for the repository's architecture.
    ///
    /// # Errors
    ///
    /// - [`DiagramError::RateLimited`] or [`DiagramError::Exhausted`] when
    ///   generation fails
    /// - [`DiagramError::InvalidDiagramData`] when the response is not a
    ///   usable description (not retried)
    pub async fn generate_architecture_diagram(
        &self,
        snapshot: &RepoSnapshot,
        tree: &TreeNode,
    ) -> Result<String, DiagramError> {
        let raw = self.llm.generate_json(&prompts::architecture_diagram(snapshot, tree)).await?;
        diagram::compile_text(&raw)
    }
}
