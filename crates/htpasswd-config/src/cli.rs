//! CLI override definitions and application logic.

use clap::Parser;
use htpasswd_auth::{BadLinePolicy, System};

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override htpasswd file path
    #[arg(long)]
    pub htpasswd_file: Option<String>,
    /// Override password systems, in order (repeatable or comma-separated)
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    pub systems: Option<Vec<System>>,
    /// Skip unparsable htpasswd lines instead of failing the load
    #[arg(long)]
    pub skip_bad_lines: bool,
    /// Override group file path
    #[arg(long)]
    pub group_file: Option<String>,
    /// Only authenticate members of this group
    #[arg(long)]
    pub require_group: Option<String>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Override log format (json/pretty/compact)
    #[arg(long)]
    pub log_format: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.htpasswd_file {
        config.htpasswd.path = v.clone();
    }
    if let Some(v) = &overrides.systems {
        config.htpasswd.systems = v.clone();
    }
    if overrides.skip_bad_lines {
        config.htpasswd.on_bad_line = BadLinePolicy::Skip;
    }
    if let Some(v) = &overrides.group_file {
        config.group.path = Some(v.clone());
    }
    if let Some(v) = &overrides.require_group {
        config.group.require = Some(v.clone());
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
    if let Some(v) = &overrides.log_format {
        config.logging.format = Some(v.clone());
    }
}
