//! CLI argument definitions.

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `repo-explainer`.
#[derive(Debug, Parser)]
#[command(
    name = "repo-explainer",
    version,
    about = "Browse GitHub repositories and get LLM explanations of their code"
)]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the root listing of a repository.
    Snapshot {
        /// Repository URL, e.g. `https://github.com/owner/repo`.
        url: String,
    },
    /// List one directory of a repository.
    Ls {
        /// Repository URL.
        url: String,
        /// Directory path from the repository root.
        path: String,
    },
    /// Print the repository tree down to a depth limit.
    Tree {
        /// Repository URL.
        url: String,
        /// Directory to start from (defaults to the root).
        #[arg(long, default_value = "")]
        path: String,
        /// Maximum recursion depth.
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Explain a whole repository.
    ExplainRepo {
        /// Repository URL.
        url: String,
    },
    /// Explain the purpose of a directory.
    ExplainDir {
        /// Repository URL.
        url: String,
        /// Directory path from the repository root.
        path: String,
    },
    /// Explain a file, or answer a question about it.
    ExplainFile {
        /// Repository URL.
        url: String,
        /// File path from the repository root.
        path: String,
        /// Ask this question instead of requesting a general explanation.
        #[arg(long)]
        question: Option<String>,
    },
    /// List the functions in a file, optionally explaining them.
    Functions {
        /// Repository URL.
        url: String,
        /// File path from the repository root.
        path: String,
        /// Explain every function in one batch request.
        #[arg(long, conflicts_with = "name")]
        explain: bool,
        /// Explain only the named function in detail.
        #[arg(long)]
        name: Option<String>,
    },
    /// Generate a Mermaid architecture diagram.
    Diagram {
        /// Repository URL.
        url: String,
    },
}
