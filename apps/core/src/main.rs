use std::process::ExitCode;

use markfind_core::runtime;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match runtime::parse_cli_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("markfind: {message}");
            return ExitCode::from(runtime::USAGE_EXIT_CODE);
        }
    };

    match runtime::run_with_options(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "markfind stopped");
            eprintln!("markfind: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}
