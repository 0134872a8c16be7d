//! htpasswd-auth standalone binary.

use std::process::ExitCode;

use clap::Parser;
use htpasswd_auth::{AuthArgs, cli};

fn main() -> ExitCode {
    let args = AuthArgs::parse();

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
