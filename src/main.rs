//! Unified htpasswd-rs CLI.
//!
//! This binary provides a unified interface to all components:
//! - `htpasswd-rs auth` - Check, hash and list htpasswd credentials
//! - `htpasswd-rs helper` - Run the stdin authentication helper
//!
//! Each subcommand can also be run as a standalone binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// htpasswd-rs unified CLI.
#[derive(Parser)]
#[command(
    name = "htpasswd-rs",
    version,
    about = "Apache htpasswd authentication tools",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check, hash and inspect htpasswd credentials.
    #[command(name = "auth")]
    Auth(htpasswd_auth::AuthArgs),

    /// Answer `username password` lines on stdin with OK or ERR.
    #[command(name = "helper")]
    Helper(Box<htpasswd_helper::HelperArgs>),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Auth(args) => htpasswd_auth::cli::run(args),
        Commands::Helper(args) => htpasswd_helper::cli::run(*args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
