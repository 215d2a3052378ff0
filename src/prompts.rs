//! Instruction text for every kind of generation request.
//!
//! Builders are pure: they format inputs into a fixed section template and
//! never touch the network.

use std::fmt::Write as _;

use crate::functions::FunctionSnippet;
use crate::github::{FileEntry, RepoSnapshot, TreeNode};
use crate::truncate::{cap, Truncated};

/// Stand-in for a function the batch response did not cover.
pub const NO_EXPLANATION: &str = "No explanation available.";

/// Broad file categories, each with its own requested sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Program source.
    Code,
    /// JSON data or manifests.
    Json,
    /// Markdown documents.
    Markdown,
    /// YAML, TOML, INI, XML and similar configuration.
    Config,
    /// Anything else.
    Generic,
}

impl FileKind {
    /// Classifies a file by the extension of `path`.
    #[must_use]
    pub fn detect(path: &str) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path);
        let Some((_, extension)) = name.rsplit_once('.') else {
            return Self::Generic;
        };
        match extension.to_ascii_lowercase().as_str() {
            "rs" | "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "py" | "go" | "java" | "kt"
            | "kts" | "c" | "h" | "cc" | "cpp" | "cxx" | "hpp" | "cs" | "rb" | "php" | "swift"
            | "scala" | "sh" | "lua" | "dart" | "vue" | "svelte" => Self::Code,
            "json" | "jsonc" => Self::Json,
            "md" | "markdown" | "mdx" => Self::Markdown,
            "yaml" | "yml" | "toml" | "ini" | "xml" | "cfg" | "conf" | "properties" => Self::Config,
            _ => Self::Generic,
        }
    }

    fn sections(self) -> &'static str {
        match self {
            Self::Code => {
                "1. **Purpose**: What this file does and where it fits in the project.\n\
                 2. **Key Components**: The main functions, types or classes and their roles.\n\
                 3. **How It Works**: The control flow and important logic, step by step.\n\
                 4. **Dependencies**: Imports and what they are used for.\n\
                 5. **Notable Details**: Patterns, edge cases or potential issues worth knowing.\n"
            }
            Self::Json => {
                "1. **Purpose**: What this data or manifest configures.\n\
                 2. **Structure**: The top-level keys and how they are organized.\n\
                 3. **Important Values**: Entries that change behavior, with their meaning.\n\
                 4. **Usage**: Which tools or code read this file.\n"
            }
            Self::Markdown => {
                "1. **Summary**: The main message of the document.\n\
                 2. **Key Sections**: What each major section covers.\n\
                 3. **Audience**: Who the document is written for.\n\
                 4. **Takeaways**: Instructions or facts a reader should remember.\n"
            }
            Self::Config => {
                "1. **Purpose**: What system or tool this configuration controls.\n\
                 2. **Settings**: The important settings and their effect.\n\
                 3. **Environment**: Environments, stages or targets it defines.\n\
                 4. **Caveats**: Values that look risky, unusual or easy to get wrong.\n"
            }
            Self::Generic => {
                "1. **Overview**: What this file is and what it contains.\n\
                 2. **Structure**: How the content is organized.\n\
                 3. **Role**: How it is likely used within the repository.\n"
            }
        }
    }
}

fn push_content(prompt: &mut String, label: &str, language: &str, content: &Truncated) {
    if content.truncated {
        let _ = writeln!(
            prompt,
            "Note: the {label} was too long and {} characters were omitted from the middle. \
             The beginning and the end are shown. Work with what is provided and never \
             claim that you lack enough context.\n",
            content.omitted
        );
    } else {
        let _ = writeln!(
            prompt,
            "The complete {label} is shown below. Never claim that you lack enough context.\n"
        );
    }
    let _ = writeln!(prompt, "```{language}\n{}\n```\n", content.text);
}

fn fence_language(path: &str) -> &str {
    match FileKind::detect(path) {
        FileKind::Generic => "",
        _ => path.rsplit_once('.').map_or("", |(_, ext)| ext),
    }
}

/// Prompt for an overview of a whole repository.
#[must_use]
pub fn repository_summary(
    snapshot: &RepoSnapshot,
    tree: &TreeNode,
    readme: Option<&Truncated>,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are an experienced software engineer explaining the GitHub repository \
         {}/{} (default branch `{}`) to a developer seeing it for the first time.\n",
        snapshot.owner, snapshot.name, snapshot.default_branch
    );
    let _ = writeln!(prompt, "## Repository Structure\n\n```\n{}```\n", tree.outline());

    if let Some(readme) = readme {
        prompt.push_str("## README\n\n");
        push_content(&mut prompt, "README", "markdown", readme);
    }

    prompt.push_str(
        "## Instructions\n\n\
         Provide:\n\
         1. **Overview**: What the project does and who it is for.\n\
         2. **Architecture**: The main parts of the codebase and how they relate.\n\
         3. **Technologies**: Languages, frameworks and notable libraries.\n\
         4. **Entry Points**: Where execution or reading should start.\n\
         5. **Getting Started**: How a newcomer would build, run or explore it.\n\n\
         Use Markdown headings and keep each section concise.\n",
    );
    prompt
}

/// Prompt describing one directory from its listing.
#[must_use]
pub fn directory_summary(repo: &str, path: &str, entries: &[FileEntry]) -> String {
    let mut prompt = String::new();
    let location = if path.is_empty() { "the root directory" } else { path };
    let _ = writeln!(
        prompt,
        "Explain the purpose of {location} in the GitHub repository {repo}.\n\n## Contents\n"
    );
    for entry in entries {
        if entry.is_dir() {
            let _ = writeln!(prompt, "- {}/ (directory)", entry.name);
        } else {
            let size = entry.size.map_or_else(String::new, |s| format!(", {s} bytes"));
            let _ = writeln!(prompt, "- {} (file{size})", entry.name);
        }
    }
    prompt.push_str(
        "\n## Instructions\n\n\
         Based on the names and organization of these entries, describe:\n\
         1. **Purpose**: What this directory is responsible for.\n\
         2. **Contents**: What the important files and subdirectories likely contain.\n\
         3. **Relationships**: How this directory relates to the rest of the project.\n\
         Do not say that you need to see file contents; infer from what is listed.\n",
    );
    prompt
}

/// Prompt for a whole-file explanation; the section template follows the
/// file kind.
#[must_use]
pub fn file_summary(repo: &str, path: &str, content: &Truncated) -> String {
    let kind = FileKind::detect(path);
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Explain the file `{path}` from the GitHub repository {repo}.\n");
    push_content(&mut prompt, "file", fence_language(path), content);
    prompt.push_str("## Instructions\n\nProvide:\n");
    prompt.push_str(kind.sections());
    prompt.push_str("\nInclude short code excerpts where they help, in fenced code blocks.\n");
    prompt
}

/// Prompt answering a free-form question about a file.
#[must_use]
pub fn question(repo: &str, path: &str, content: &Truncated, question: &str) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Answer a question about the file `{path}` from the GitHub repository {repo}.\n"
    );
    push_content(&mut prompt, "file", fence_language(path), content);
    let _ = writeln!(prompt, "## Question\n\n{}\n", question.trim());
    prompt.push_str(
        "## Instructions\n\n\
         Answer directly and specifically, referring to the code shown. \
         Quote relevant lines in fenced code blocks when useful.\n",
    );
    prompt
}

/// Prompt explaining a single function in the context of its file.
#[must_use]
pub fn function_summary(path: &str, function: &FunctionSnippet) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Explain the function `{}` defined at line {} of `{path}`.\n\n```{}\n{}\n```\n",
        function.name,
        function.line,
        fence_language(path),
        function.code
    );
    prompt.push_str(
        "## Instructions\n\n\
         Provide:\n\
         1. **Purpose**: What the function does.\n\
         2. **Parameters and Result**: Inputs, outputs and side effects.\n\
         3. **Logic**: How it works, step by step.\n\
         4. **Edge Cases**: Error handling and unusual inputs.\n",
    );
    prompt
}

/// Prompt explaining many functions in one request.
///
/// Each excerpt is capped at `excerpt_cap` characters. The response must
/// contain one `FUNCTION_<n>: <explanation>` line per function, numbered
/// from 1; see [`parse_function_batch`].
#[must_use]
pub fn function_batch(path: &str, functions: &[FunctionSnippet], excerpt_cap: usize) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Briefly explain each of the following {} functions from `{path}`.\n",
        functions.len()
    );
    let language = fence_language(path);
    for (index, function) in functions.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "### Function {}: {}\n```{language}\n{}\n```\n",
            index + 1,
            function.name,
            cap(&function.code, excerpt_cap)
        );
    }
    prompt.push_str(
        "## Response Format\n\n\
         Reply with exactly one line per function, in order, and nothing else:\n\
         FUNCTION_1: <one or two sentence explanation>\n\
         FUNCTION_2: <one or two sentence explanation>\n\
         ...\n\
         Some excerpts may be cut short; explain them from what is shown.\n",
    );
    prompt
}

/// Splits a batch response into one explanation per function.
///
/// Looks for a line starting with `FUNCTION_<n>:` for each index; a missing
/// or empty entry becomes [`NO_EXPLANATION`].
#[must_use]
pub fn parse_function_batch(response: &str, count: usize) -> Vec<String> {
    (1..=count)
        .map(|index| {
            let prefix = format!("FUNCTION_{index}:");
            response
                .lines()
                .map(|line| line.trim().trim_start_matches(['*', '-', ' ']))
                .find_map(|line| line.strip_prefix(&prefix))
                .map(|rest| rest.trim().trim_start_matches("**").trim())
                .filter(|rest| !rest.is_empty())
                .map_or_else(|| NO_EXPLANATION.to_string(), String::from)
        })
        .collect()
}

/// Prompt requesting a JSON architecture description of a repository.
#[must_use]
pub fn architecture_diagram(snapshot: &RepoSnapshot, tree: &TreeNode) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "Analyze the structure of the GitHub repository {}/{} and describe its architecture.\n",
        snapshot.owner, snapshot.name
    );
    let _ = writeln!(prompt, "## Repository Structure\n\n```\n{}```\n", tree.outline());
    prompt.push_str(
        "## Instructions\n\n\
         Group the codebase into 3 to 8 modules, each with the components (directories or \
         key files) that belong to it, and list how components depend on each other.\n\n\
         Respond with JSON only, no markdown fences, in exactly this shape:\n\
         {\n  \
           \"modules\": [\n    \
             {\"id\": \"api\", \"label\": \"API Layer\", \
             \"components\": [{\"id\": \"routes\", \"label\": \"HTTP Routes\"}]}\n  \
           ],\n  \
           \"relationships\": [\n    \
             {\"from\": \"routes\", \"to\": \"db_client\", \
             \"kind\": \"solid\", \"label\": \"queries\"}\n  \
           ]\n\
         }\n\n\
         - Component ids must be unique and use only letters, digits and underscores.\n\
         - Relationship endpoints must be component ids declared above.\n\
         - Use \"solid\" for direct calls or imports and \"dotted\" for indirect or \
         optional links.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::EntryKind;
    use crate::truncate::truncate;

    fn entry(name: &str, kind: EntryKind) -> FileEntry {
        FileEntry {
            name: name.into(),
            path: format!("src/{name}"),
            kind,
            size: Some(10),
            download_url: None,
            content_hash: None,
            api_url: None,
        }
    }

    fn snapshot() -> RepoSnapshot {
        RepoSnapshot {
            name: "demo".into(),
            owner: "octo".into(),
            path: String::new(),
            default_branch: "main".into(),
            files: vec![],
        }
    }

    #[test]
    fn detects_file_kinds() {
        assert_eq!(FileKind::detect("src/main.rs"), FileKind::Code);
        assert_eq!(FileKind::detect("web/App.TSX"), FileKind::Code);
        assert_eq!(FileKind::detect("package.json"), FileKind::Json);
        assert_eq!(FileKind::detect("docs/README.md"), FileKind::Markdown);
        assert_eq!(FileKind::detect(".github/ci.yml"), FileKind::Config);
        assert_eq!(FileKind::detect("Cargo.toml"), FileKind::Config);
        assert_eq!(FileKind::detect("LICENSE"), FileKind::Generic);
        assert_eq!(FileKind::detect("v1.2/notes.txt"), FileKind::Generic);
    }

    #[test]
    fn file_prompt_uses_kind_template() {
        let code = file_summary("octo/demo", "src/lib.rs", &truncate("fn a() {}", 100));
        assert!(code.contains("**Key Components**"));
        assert!(code.contains("```rs\nfn a() {}\n```"));

        let config = file_summary("octo/demo", "ci.yml", &truncate("on: push", 100));
        assert!(config.contains("**Settings**"));
        assert!(!config.contains("**Key Components**"));
    }

    #[test]
    fn truncation_is_always_annotated() {
        let full = file_summary("octo/demo", "a.py", &truncate("print(1)", 100));
        assert!(full.contains("The complete file is shown below."));
        assert!(full.contains("Never claim that you lack enough context"));

        let cut = file_summary("octo/demo", "a.py", &truncate(&"x".repeat(500), 100));
        assert!(cut.contains("400 characters were omitted"));
        assert!(cut.contains("never claim that you lack enough context"));
    }

    #[test]
    fn question_prompt_includes_question() {
        let prompt = question("octo/demo", "a.go", &truncate("package a", 100), "  Why?  ");
        assert!(prompt.contains("## Question\n\nWhy?\n"));
    }

    #[test]
    fn directory_prompt_lists_entries() {
        let entries = [entry("lib", EntryKind::Dir), entry("a.ts", EntryKind::File)];
        let prompt = directory_summary("octo/demo", "src", &entries);
        assert!(prompt.contains("- lib/ (directory)"));
        assert!(prompt.contains("- a.ts (file, 10 bytes)"));
    }

    #[test]
    fn repository_and_diagram_prompts_embed_outline() {
        let mut tree = TreeNode::dir("demo", "");
        tree.children.push(TreeNode::dir("src", "src"));
        let summary = repository_summary(&snapshot(), &tree, None);
        assert!(summary.contains("octo/demo"));
        assert!(summary.contains("src/"));

        let diagram = architecture_diagram(&snapshot(), &tree);
        assert!(diagram.contains("\"modules\""));
        assert!(diagram.contains("JSON only"));
    }

    #[test]
    fn batch_prompt_caps_excerpts() {
        let long = FunctionSnippet { name: "big".into(), line: 1, code: "y".repeat(800) };
        let prompt = function_batch("a.rs", &[long], 500);
        assert!(prompt.contains(&format!("{}...", "y".repeat(500))));
        assert!(!prompt.contains(&"y".repeat(501)));
        assert!(prompt.contains("FUNCTION_1: <one or two sentence explanation>"));
    }

    #[test]
    fn batch_parse_is_positional_with_sentinel() {
        let response = "Here you go:\nFUNCTION_1: Adds numbers.\n\
                        **FUNCTION_3:** Parses input.\nFUNCTION_2:   \n";
        let parsed = parse_function_batch(response, 4);
        assert_eq!(
            parsed,
            vec!["Adds numbers.", NO_EXPLANATION, "Parses input.", NO_EXPLANATION]
        );
    }

    #[test]
    fn batch_parse_does_not_confuse_prefixes() {
        let response = "FUNCTION_10: tenth\nFUNCTION_1: first";
        assert_eq!(parse_function_batch(response, 1), vec!["first"]);
    }
}
