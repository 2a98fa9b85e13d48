use std::path::Path;

use crate::error::{AppError, AppResult, ConfigError};

use super::types::RunConfig;

/// Loads and validates a controller run configuration.
///
/// The credential key file, when configured, is read here so that its
/// contents can be inlined into every control message.
///
/// # Errors
///
/// Returns an error when the file cannot be read or parsed, or when a
/// validated field is out of range.
pub fn load_run_config(path: &Path) -> AppResult<RunConfig> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    let mut config: RunConfig = toml::from_str(&content).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    validate(&config)?;

    if let Some(key_path) = config.storage.key_path.clone() {
        let key_path = Path::new(&key_path);
        config.storage_key = std::fs::read_to_string(key_path).map_err(|err| {
            AppError::config(ConfigError::ReadStorageKey {
                path: key_path.to_path_buf(),
                source: err,
            })
        })?;
    }

    Ok(config)
}

fn validate(config: &RunConfig) -> AppResult<()> {
    if config.peer_ips.is_empty() {
        return Err(AppError::config(ConfigError::EmptyPeerList));
    }
    let step2 = &config.step2;
    if step2.skip {
        return Ok(());
    }
    if step2.total_requests == 0 {
        return Err(AppError::config(ConfigError::ZeroTotalRequests));
    }
    if step2.clients == 0 {
        return Err(AppError::config(ConfigError::ZeroClients));
    }
    if step2.connections == 0 {
        return Err(AppError::config(ConfigError::ZeroConnections));
    }
    if step2.key_size == 0 {
        return Err(AppError::config(ConfigError::ZeroKeySize));
    }
    if step2.value_size == 0 && step2.value_test_data_path.is_none() {
        return Err(AppError::config(ConfigError::ZeroValueSize));
    }
    Ok(())
}
