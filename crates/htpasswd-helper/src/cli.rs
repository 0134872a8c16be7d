//! CLI module for htpasswd-helper.
//!
//! Used by the standalone binary and by the `helper` subcommand of the
//! unified htpasswd-rs CLI.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use htpasswd_config::{
    CliOverrides, Config, ConfigError, LoggingConfig, apply_overrides, load_config,
    validate_config,
};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::authenticator::Authenticator;
use crate::serve::serve;

/// htpasswd helper CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "htpasswd-helper",
    version,
    about = "Answer `username password` lines on stdin with OK or ERR"
)]
pub struct HelperArgs {
    /// Config file path (json/yaml/toml). Without it, settings come from flags.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Run the helper until stdin closes or a shutdown signal arrives.
pub async fn run(args: HelperArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    init_tracing(&config.logging);

    let auth = Arc::new(Authenticator::from_config(&config)?);

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    #[cfg(unix)]
    {
        let auth_reload = auth.clone();
        let shutdown_reload = shutdown.clone();
        tokio::spawn(async move {
            reload_signal_handler(auth_reload, shutdown_reload).await;
        });
    }

    info!(path = %config.htpasswd.path, "helper ready");
    let answered = serve(
        auth,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        shutdown.clone(),
    )
    .await?;
    shutdown.cancel();
    info!(answered, "helper stopped");
    Ok(())
}

/// Load, override and validate the configuration.
fn build_config(args: &HelperArgs) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;
    // stdout carries the replies.
    if config.logging.output.as_deref() == Some("stdout") {
        return Err(ConfigError::Validation(
            "logging.output must be stderr for the helper".into(),
        ));
    }
    Ok(config)
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Reload the htpasswd and group files on SIGHUP (Unix only).
#[cfg(unix)]
async fn reload_signal_handler(auth: Arc<Authenticator>, shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            warn!("failed to install SIGHUP handler: {}, reload disabled", e);
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = sighup.recv() => {}
        }
        info!("SIGHUP received, reloading credentials");

        let auth = auth.clone();
        match tokio::task::spawn_blocking(move || auth.reload()).await {
            Ok(Ok(users)) => info!(users, "credentials reloaded"),
            Ok(Err(e)) => warn!("failed to reload credentials, keeping previous: {}", e),
            Err(e) => warn!("reload task failed: {}", e),
        }
    }
}

/// Initialize tracing subscriber with the given logging configuration.
///
/// Supports:
/// - `level`: Base log level (trace, debug, info, warn, error)
/// - `format`: Output format (json, pretty, compact). Default: pretty
/// - `filters`: Per-module log level overrides
///
/// Output always goes to stderr.
fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_new(filter_directives(config))
        .unwrap_or_else(|_| EnvFilter::new(htpasswd_config::DEFAULT_LOG_LEVEL));

    let format = config
        .format
        .as_deref()
        .unwrap_or(htpasswd_config::DEFAULT_LOG_FORMAT);

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
}

/// Base level followed by per-module directives.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config
        .level
        .as_deref()
        .unwrap_or(htpasswd_config::DEFAULT_LOG_LEVEL)
        .to_string();

    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort();
    for (module, level) in filters {
        directives.push(',');
        directives.push_str(module);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn directives_from_logging_config() {
        let mut logging = LoggingConfig::default();
        assert_eq!(filter_directives(&logging), "info");

        logging.level = Some("warn".into());
        logging.filters.insert("htpasswd_helper".into(), "debug".into());
        logging.filters.insert("htpasswd_auth".into(), "trace".into());
        assert_eq!(
            filter_directives(&logging),
            "warn,htpasswd_auth=trace,htpasswd_helper=debug"
        );
    }

    #[test]
    fn config_from_flags_only() {
        let args = HelperArgs::try_parse_from([
            "htpasswd-helper",
            "--htpasswd-file",
            "/etc/htpasswd",
            "--log-level",
            "debug",
        ])
        .unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.htpasswd.path, "/etc/htpasswd");
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn missing_path_is_rejected() {
        let args = HelperArgs::try_parse_from(["htpasswd-helper"]).unwrap();
        assert!(matches!(
            build_config(&args),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn stdout_logging_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helper.toml");
        fs::write(
            &path,
            "[htpasswd]\npath = \"users\"\n\n[logging]\noutput = \"stdout\"\n",
        )
        .unwrap();

        let args =
            HelperArgs::try_parse_from(["htpasswd-helper", "--config", path.to_str().unwrap()])
                .unwrap();
        match build_config(&args) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("stderr")),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}
