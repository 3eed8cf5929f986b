//! cstore binary entry point.

use std::process::ExitCode;

use cstore::ui::output;

fn main() -> ExitCode {
    match cstore::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
