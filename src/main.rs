use filesort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    filesort::init_tracing();

    match filesort::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
