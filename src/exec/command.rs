// src/exec/command.rs

//! Command vectors handed to the process backend, and the helper's
//! command-line contract.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// One child invocation: the program followed by its arguments.
///
/// Construction never fails; [`HelperCommand::validate`] decides whether
/// the vector can be launched at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    argv: Vec<OsString>,
}

/// Why a command vector cannot be launched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedCommand {
    #[error("command vector is empty")]
    Empty,
    #[error("argument {index} contains an interior NUL byte")]
    InteriorNul { index: usize },
}

impl HelperCommand {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
        }
    }

    /// The executable, or `None` for an empty vector.
    pub fn program(&self) -> Option<&OsStr> {
        self.argv.first().map(OsString::as_os_str)
    }

    pub fn args(&self) -> &[OsString] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// Program name as shown in error dialogs.
    pub fn program_name(&self) -> String {
        self.program()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Whole vector, lossily converted for display and assertions.
    pub fn argv_lossy(&self) -> Vec<String> {
        self.argv
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    pub fn validate(&self) -> Result<(), MalformedCommand> {
        if self.argv.is_empty() {
            return Err(MalformedCommand::Empty);
        }
        for (index, arg) in self.argv.iter().enumerate() {
            if arg.as_encoded_bytes().contains(&0) {
                return Err(MalformedCommand::InteriorNul { index });
            }
        }
        Ok(())
    }
}

impl fmt::Display for HelperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv_lossy().join(" "))
    }
}

/// Builds the three invocations the privileged helper understands:
///
/// | operation        | argv                                         |
/// |------------------|----------------------------------------------|
/// | create subvolume | `helper createsubvol <directory> <name>`     |
/// | create snapshot  | `helper create -p <source> <parent>/<name>`  |
/// | delete subvolume | `helper delete <path>`                       |
#[derive(Debug, Clone)]
pub struct Helper {
    path: PathBuf,
}

impl Helper {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn create_subvolume(&self, directory: &Path, name: &str) -> HelperCommand {
        HelperCommand::new([
            self.path.as_os_str(),
            OsStr::new("createsubvol"),
            directory.as_os_str(),
            OsStr::new(name),
        ])
    }

    /// Snapshot `source` as a sibling called `name`.
    ///
    /// Returns `None` when `source` has no parent directory to hold the
    /// snapshot.
    pub fn create_snapshot(&self, source: &Path, name: &str) -> Option<HelperCommand> {
        let parent = source.parent().filter(|p| !p.as_os_str().is_empty())?;
        let destination = parent.join(name);
        Some(HelperCommand::new([
            self.path.as_os_str(),
            OsStr::new("create"),
            OsStr::new("-p"),
            source.as_os_str(),
            destination.as_os_str(),
        ]))
    }

    pub fn delete(&self, path: &Path) -> HelperCommand {
        HelperCommand::new([self.path.as_os_str(), OsStr::new("delete"), path.as_os_str()])
    }
}
