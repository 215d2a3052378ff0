//! Binary entrypoint for the `repo-explainer` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    repo_explainer::logging::init();
    // Recording and replay are handled in commands::dispatch via
    // EXPLAINER_RECORD=<dir> and EXPLAINER_REPLAY=<file>.
    match repo_explainer::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
