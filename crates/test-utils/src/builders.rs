#![allow(dead_code)]

use std::path::Path;

use subvolmenu::config::{ConfigFile, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_helper(mut self, path: impl AsRef<Path>) -> Self {
        self.config.helper.path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_read_chunk_size(mut self, bytes: usize) -> Self {
        self.config.output.read_chunk_size = bytes;
        self
    }

    pub fn with_max_burst_bytes(mut self, bytes: usize) -> Self {
        self.config.output.max_burst_bytes = bytes;
        self
    }

    pub fn with_completion_marker(mut self, marker: &str) -> Self {
        self.config.delete.completion_marker = marker.to_string();
        self
    }

    pub fn with_prompt_suffix_len(mut self, len: usize) -> Self {
        self.config.delete.prompt_suffix_len = len;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
