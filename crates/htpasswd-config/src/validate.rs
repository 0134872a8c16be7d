//! Configuration validation logic.

use crate::Config;
use crate::defaults::{LOG_FORMATS, LOG_LEVELS, LOG_OUTPUTS};
use crate::loader::ConfigError;

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.htpasswd.path.trim().is_empty() {
        return Err(ConfigError::Validation("htpasswd.path is empty".into()));
    }
    let systems = &config.htpasswd.systems;
    if systems.is_empty() {
        return Err(ConfigError::Validation("htpasswd.systems is empty".into()));
    }
    // A catch-all anywhere but last would hide every system after it.
    if let Some(pos) = systems.iter().position(|s| s.is_catch_all())
        && pos + 1 != systems.len()
    {
        return Err(ConfigError::Validation(format!(
            "htpasswd.systems: '{}' accepts everything and must be last",
            systems[pos]
        )));
    }
    // Only the earlier of a system and its reject-* twin would ever run.
    if let Some((reject, accept)) = systems
        .iter()
        .filter_map(|s| s.refuses().map(|accepted| (*s, accepted)))
        .find(|(_, accepted)| systems.contains(accepted))
    {
        return Err(ConfigError::Validation(format!(
            "htpasswd.systems: '{reject}' conflicts with '{accept}'"
        )));
    }
    if let Some(path) = &config.group.path
        && path.trim().is_empty()
    {
        return Err(ConfigError::Validation("group.path is empty".into()));
    }
    if config.group.require.is_some() && config.group.path.is_none() {
        return Err(ConfigError::Validation(
            "group.require needs group.path".into(),
        ));
    }
    if let Some(level) = &config.logging.level
        && !LOG_LEVELS.contains(&level.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of: {:?}",
            LOG_LEVELS
        )));
    }
    if let Some(format) = &config.logging.format
        && !LOG_FORMATS.contains(&format.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.format must be one of: {:?}",
            LOG_FORMATS
        )));
    }
    if let Some(output) = &config.logging.output
        && !LOG_OUTPUTS.contains(&output.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.output must be one of: {:?}",
            LOG_OUTPUTS
        )));
    }
    Ok(())
}
