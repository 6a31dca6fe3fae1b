// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! The subcommands mirror the context-menu entries the extension offers:
//! `menu` lists what the host would show, the other subcommands activate
//! one entry and run its dialogs on the terminal.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `subvolmenu`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "subvolmenu",
    version,
    about = "Create, snapshot and delete btrfs subvolumes through the privileged helper.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If omitted, `SUBVOLMENU_CONFIG` is consulted, then built-in defaults.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SUBVOLMENU_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Print the helper invocations an action would make, execute nothing.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the context-menu entries for a location.
    #[command(subcommand)]
    Menu(MenuCommand),

    /// Create a new subvolume inside DIR.
    CreateSubvolume {
        /// Directory (path or file:// URI) that receives the subvolume.
        #[arg(value_name = "DIR")]
        directory: String,

        /// Subvolume name; skips the name dialog.
        #[arg(long)]
        name: Option<String>,
    },

    /// Snapshot SOURCE next to itself.
    Snapshot {
        /// Subvolume (path or file:// URI) to snapshot.
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Snapshot name; skips the name dialog.
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete one or more subvolumes, confirming each as the helper asks.
    Delete {
        /// Subvolumes (paths or file:// URIs) to delete.
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum MenuCommand {
    /// Entries shown when right-clicking the background of DIR.
    Background {
        #[arg(value_name = "DIR")]
        directory: String,
    },
    /// Entries shown for a selection of files.
    Files {
        #[arg(value_name = "FILE")]
        files: Vec<String>,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
