// src/config/mod.rs

//! Configuration loading and validation for subvolmenu.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk or fall back to defaults (`loader.rs`).
//! - Validate basic invariants like a usable helper path (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{CONFIG_ENV, load_and_validate, load_from_path, resolve_config};
pub use model::{ConfigFile, DeleteSection, HelperSection, OutputSection, RawConfigFile};
