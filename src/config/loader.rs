// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SubvolError};

/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_ENV: &str = "SUBVOLMENU_CONFIG";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Pick the config for this run.
///
/// - an explicit path (from `--config`) must exist and be valid;
/// - otherwise `SUBVOLMENU_CONFIG`, if set and non-empty, is loaded;
/// - otherwise the built-in defaults are used.
pub fn resolve_config(explicit: Option<&str>) -> Result<ConfigFile> {
    if explicit.is_some_and(|p| p.trim().is_empty()) {
        return Err(SubvolError::InvalidPath(
            "--config was given an empty path".to_string(),
        ));
    }
    let env_path = std::env::var(CONFIG_ENV).ok().filter(|s| !s.trim().is_empty());
    match config_path(explicit, env_path.as_deref()) {
        Some(path) => {
            debug!(path = %path.display(), "loading config file");
            load_and_validate(path)
        }
        None => {
            debug!("no config file given; using built-in defaults");
            Ok(ConfigFile::default())
        }
    }
}

fn config_path(explicit: Option<&str>, env_value: Option<&str>) -> Option<PathBuf> {
    explicit.or(env_value).map(PathBuf::from)
}
