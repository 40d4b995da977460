//! YAML configuration file handling.

use std::path::Path;

use anyhow::{Context, Result};
use nimble_control::ControlConfig;
use tracing::{debug, info};

use crate::error::DaemonError;

/// Load a [`ControlConfig`] from `path`, or the defaults when no path is
/// given. A missing file is an error; an empty file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<ControlConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(ControlConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    debug!("Loaded config from {:?}", path);
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<ControlConfig, DaemonError> {
    let config = if content.trim().is_empty() {
        ControlConfig::default()
    } else {
        serde_yaml::from_str(content)?
    };
    config
        .validate()
        .map_err(|e| DaemonError::InvalidConfiguration(e.to_string()))?;
    Ok(config)
}

/// Write `config` as YAML, creating parent directories.
pub fn save_config(config: &ControlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let content = serde_yaml::to_string(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    debug!("Saved config to {:?}", path);
    Ok(())
}
