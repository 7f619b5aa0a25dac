//! specstack binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match specstack::cli::run() {
        Ok(signal) => exit(signal.exit_code()),
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit(specstack::cli::signal_for(&err).exit_code())
        }
    }
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
