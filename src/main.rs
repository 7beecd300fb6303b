#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    pmtui::cli::main()
}
