use std::process::ExitCode;

use starcast::ui::output;

fn main() -> ExitCode {
    match starcast::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
