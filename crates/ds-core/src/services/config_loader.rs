use std::path::Path;

use crate::error::{Result, SyncError};
use crate::models::SyncConfig;

pub const DEFAULT_CONFIG_FILENAME: &str = "ds-sync.yaml";

pub fn load(config_path: &Path) -> Result<SyncConfig> {
    if !config_path.exists() {
        return Err(SyncError::ConfigNotFound(config_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(config_path)?;
    let config: SyncConfig =
        serde_yaml::from_str(&contents).map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &SyncConfig) -> Result<()> {
    if config.file_server_url.trim().is_empty() {
        return Err(SyncError::InvalidConfig(
            "file_server_url field is required".into(),
        ));
    }
    if config.lifecycles.is_empty() {
        return Err(SyncError::InvalidConfig(
            "at least one lifecycle must be configured".into(),
        ));
    }
    if config.min_cpu_proxy >= config.max_cpu_proxy {
        return Err(SyncError::InvalidConfig(format!(
            "min_cpu_proxy ({}) must be below max_cpu_proxy ({})",
            config.min_cpu_proxy, config.max_cpu_proxy
        )));
    }
    Ok(())
}
