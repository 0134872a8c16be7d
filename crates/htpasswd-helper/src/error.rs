//! Helper error types.

use htpasswd_auth::HtpasswdError;
use htpasswd_config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("htpasswd: {0}")]
    Htpasswd(#[from] HtpasswdError),
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("verification task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
