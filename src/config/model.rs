// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Install location of the privileged helper shipped with the extension.
pub const DEFAULT_HELPER_PATH: &str = "/usr/local/bin/nautilus-btrfs";

/// Bytes requested from a pipe per read call.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Upper bound on the bytes gathered from one readiness event before they
/// are handed to the supervisor.
pub const DEFAULT_MAX_BURST_BYTES: usize = 1024 * 1024;

/// Line ending the delete helper prints once an item is gone.
pub const DEFAULT_COMPLETION_MARKER: &str = "deleted.\n";

/// Characters trimmed from a confirmation request before it is shown.
pub const DEFAULT_PROMPT_SUFFIX_LEN: usize = 8;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [helper]
/// path = "/usr/local/bin/nautilus-btrfs"
///
/// [output]
/// read_chunk_size = 4096
/// max_burst_bytes = 1048576
///
/// [delete]
/// completion_marker = "deleted.\n"
/// prompt_suffix_len = 8
/// ```
///
/// All sections are optional and have defaults matching the shipped helper.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub helper: HelperSection,

    #[serde(default)]
    pub output: OutputSection,

    #[serde(default)]
    pub delete: DeleteSection,
}

/// `[helper]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct HelperSection {
    /// Executable invoked for every volume operation.
    #[serde(default = "default_helper_path")]
    pub path: PathBuf,
}

fn default_helper_path() -> PathBuf {
    PathBuf::from(DEFAULT_HELPER_PATH)
}

impl Default for HelperSection {
    fn default() -> Self {
        Self {
            path: default_helper_path(),
        }
    }
}

/// `[output]` section: how asynchronous helpers' pipes are read.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,

    /// A readiness event keeps reading chunks until the pipe would block or
    /// this many bytes have been gathered.
    #[serde(default = "default_max_burst_bytes")]
    pub max_burst_bytes: usize,
}

fn default_read_chunk_size() -> usize {
    DEFAULT_READ_CHUNK_SIZE
}

fn default_max_burst_bytes() -> usize {
    DEFAULT_MAX_BURST_BYTES
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            read_chunk_size: default_read_chunk_size(),
            max_burst_bytes: default_max_burst_bytes(),
        }
    }
}

/// `[delete]` section: the line protocol spoken by `helper delete`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteSection {
    #[serde(default = "default_completion_marker")]
    pub completion_marker: String,

    #[serde(default = "default_prompt_suffix_len")]
    pub prompt_suffix_len: usize,
}

fn default_completion_marker() -> String {
    DEFAULT_COMPLETION_MARKER.to_string()
}

fn default_prompt_suffix_len() -> usize {
    DEFAULT_PROMPT_SUFFIX_LEN
}

impl Default for DeleteSection {
    fn default() -> Self {
        Self {
            completion_marker: default_completion_marker(),
            prompt_suffix_len: default_prompt_suffix_len(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// `ConfigFile::default()`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub helper: HelperSection,
    pub output: OutputSection,
    pub delete: DeleteSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        helper: HelperSection,
        output: OutputSection,
        delete: DeleteSection,
    ) -> Self {
        Self {
            helper,
            output,
            delete,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        let raw = RawConfigFile::default();
        Self::new_unchecked(raw.helper, raw.output, raw.delete)
    }
}
