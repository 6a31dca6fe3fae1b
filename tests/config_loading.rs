// tests/config_loading.rs

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use subvolmenu::config::{ConfigFile, load_and_validate, resolve_config};
use subvolmenu::errors::SubvolError;
use subvolmenu_test_utils::builders::ConfigFileBuilder;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_full_config_is_loaded() {
    let file = write_config(
        r#"
[helper]
path = "/opt/btrfs/helper"

[output]
read_chunk_size = 512
max_burst_bytes = 8192

[delete]
completion_marker = "removed\n"
prompt_suffix_len = 4
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.helper.path, Path::new("/opt/btrfs/helper"));
    assert_eq!(cfg.output.read_chunk_size, 512);
    assert_eq!(cfg.output.max_burst_bytes, 8192);
    assert_eq!(cfg.delete.completion_marker, "removed\n");
    assert_eq!(cfg.delete.prompt_suffix_len, 4);
}

#[test]
fn test_missing_sections_fall_back_to_defaults() {
    let file = write_config("[helper]\npath = \"/opt/helper\"\n");

    let cfg = load_and_validate(file.path()).unwrap();
    let defaults = ConfigFile::default();
    assert_eq!(cfg.helper.path, Path::new("/opt/helper"));
    assert_eq!(cfg.output.read_chunk_size, defaults.output.read_chunk_size);
    assert_eq!(cfg.delete.completion_marker, "deleted.\n");
    assert_eq!(cfg.delete.prompt_suffix_len, 8);
}

#[test]
fn test_zero_chunk_size_returns_config_error() {
    let file = write_config("[output]\nread_chunk_size = 0\n");

    match load_and_validate(file.path()) {
        Err(SubvolError::ConfigError(msg)) => assert!(msg.contains("read_chunk_size")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn test_empty_helper_path_returns_config_error() {
    let file = write_config("[helper]\npath = \"\"\n");

    match load_and_validate(file.path()) {
        Err(SubvolError::ConfigError(msg)) => assert!(msg.contains("[helper].path")),
        other => panic!("Expected ConfigError, got: {other:?}"),
    }
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = write_config("[output\nread_chunk_size = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(SubvolError::TomlError(_))
    ));
}

#[test]
fn test_explicit_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let result = resolve_config(Some(missing.to_str().unwrap()));
    assert!(matches!(result, Err(SubvolError::IoError(_))));
}

#[test]
fn test_explicit_path_is_used() {
    let file = write_config("[helper]\npath = \"/opt/other\"\n");

    let cfg = resolve_config(Some(file.path().to_str().unwrap())).unwrap();
    assert_eq!(cfg.helper.path, Path::new("/opt/other"));
}

#[test]
fn test_builder_rejects_burst_smaller_than_chunk() {
    let raw = ConfigFileBuilder::new()
        .with_read_chunk_size(4096)
        .with_max_burst_bytes(1024)
        .raw();

    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(SubvolError::ConfigError(_))
    ));
}

#[test]
fn test_empty_explicit_path_is_invalid() {
    assert!(matches!(
        resolve_config(Some("  ")),
        Err(SubvolError::InvalidPath(_))
    ));
}
