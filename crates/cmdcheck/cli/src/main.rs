use colored::Colorize;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cmdcheck_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            ExitCode::FAILURE
        }
    }
}
