// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SubvolError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SubvolError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.helper, raw.output, raw.delete))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_helper(cfg)?;
    validate_output(cfg)?;
    validate_delete(cfg)?;
    Ok(())
}

fn validate_helper(cfg: &RawConfigFile) -> Result<()> {
    if cfg.helper.path.as_os_str().is_empty() {
        return Err(SubvolError::ConfigError(
            "[helper].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_output(cfg: &RawConfigFile) -> Result<()> {
    let out = &cfg.output;
    if out.read_chunk_size == 0 {
        return Err(SubvolError::ConfigError(
            "[output].read_chunk_size must be >= 1 (got 0)".to_string(),
        ));
    }
    if out.max_burst_bytes < out.read_chunk_size {
        return Err(SubvolError::ConfigError(format!(
            "[output].max_burst_bytes ({}) must be >= read_chunk_size ({})",
            out.max_burst_bytes, out.read_chunk_size
        )));
    }
    Ok(())
}

fn validate_delete(cfg: &RawConfigFile) -> Result<()> {
    if cfg.delete.completion_marker.is_empty() {
        return Err(SubvolError::ConfigError(
            "[delete].completion_marker must not be empty".to_string(),
        ));
    }
    Ok(())
}
