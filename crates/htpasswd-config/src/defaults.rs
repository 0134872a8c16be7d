//! Default values for serde deserialization.

use htpasswd_auth::System;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "pretty";
pub const DEFAULT_LOG_OUTPUT: &str = "stderr";

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
pub const LOG_FORMATS: [&str; 3] = ["json", "pretty", "compact"];
pub const LOG_OUTPUTS: [&str; 2] = ["stdout", "stderr"];

pub(crate) fn default_systems() -> Vec<System> {
    System::DEFAULT.to_vec()
}
