//! htpasswd helper standalone binary.

use clap::Parser;
use htpasswd_helper::{HelperArgs, cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = HelperArgs::parse();
    cli::run(args).await
}
