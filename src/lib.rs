//! Browse GitHub repositories and ask a Gemini model to explain them.
//!
//! The library is organised as ports and adapters: [`ports`] defines the
//! HTTP and clock boundaries, [`adapters`] implements them live, recorded,
//! replayed or simulated, and the services ([`github::fetcher`], [`llm`],
//! [`explain`]) are built on top through a [`context::ServiceContext`].

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod diagram;
pub mod error;
pub mod explain;
pub mod functions;
pub mod github;
pub mod llm;
pub mod logging;
pub mod ports;
pub mod prompts;
pub mod truncate;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    runtime.block_on(commands::dispatch(&cli.command))
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["repo-explainer", "unknown"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_rejects_invalid_repository_url() {
        let result = run(["repo-explainer", "snapshot", "not a url"]);
        let err = result.unwrap_err();
        assert!(err.contains("Invalid GitHub repository URL"), "unexpected error: {err}");
    }
}
