//! Configuration loading and CLI definitions for htpasswd-rs.
//!
//! Files may be TOML, YAML or JSON (comments allowed in `.jsonc`):
//!
//! ```toml
//! [htpasswd]
//! path = "/etc/nginx/.htpasswd"
//! systems = ["md5", "sha", "bcrypt", "ssha", "crypt-sha", "reject-plain"]
//! on_bad_line = "skip"
//!
//! [group]
//! path = "/etc/nginx/.htgroup"
//! require = "admins"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use defaults::{DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, DEFAULT_LOG_OUTPUT};
pub use loader::{ConfigError, load_config};
pub use types::{Config, GroupConfig, HtpasswdConfig, LoggingConfig};
pub use validate::validate_config;
