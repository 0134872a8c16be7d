//! Configuration type definitions for the htpasswd table, groups and logging.

use std::collections::HashMap;

use htpasswd_auth::{BadLinePolicy, Options, ParserChain, System};
use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub htpasswd: HtpasswdConfig,
    #[serde(default)]
    pub group: GroupConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtpasswdConfig {
    /// Path of the htpasswd file.
    pub path: String,
    /// Password systems tried in order. A catch-all (`plain` or
    /// `reject-plain`) may only appear last. `reject-<system>` refuses the
    /// records of one system so they never reach `plain`.
    #[serde(default = "default_systems")]
    pub systems: Vec<System>,
    /// What to do with unparsable lines: abort (default) or skip.
    #[serde(default)]
    pub on_bad_line: BadLinePolicy,
}

impl Default for HtpasswdConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            systems: default_systems(),
            on_bad_line: BadLinePolicy::default(),
        }
    }
}

impl HtpasswdConfig {
    /// Table options built from this section.
    pub fn options(&self) -> Options {
        Options::default()
            .with_chain(ParserChain::from_systems(self.systems.iter().copied()))
            .on_bad_line(self.on_bad_line)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Path of an Apache group file.
    #[serde(default)]
    pub path: Option<String>,
    /// Only members of this group are authenticated.
    #[serde(default)]
    pub require: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"htpasswd_auth": "debug"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
