//! cainiao: track Cainiao parcels from the terminal.

use std::process::ExitCode;

use cainiao_tracker::cli;

fn main() -> ExitCode {
    // Logging is initialized by cli::run based on --log-level and --log-format
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");

            // Print cause chain in debug mode
            if std::env::var("RUST_BACKTRACE").is_ok() {
                if let Some(source) = std::error::Error::source(&e) {
                    eprintln!("Caused by: {source}");
                }
            }

            if e.is_transient() {
                eprintln!("Check your connection and try again.");
            }

            ExitCode::from(e.exit_code() as u8)
        }
    }
}
