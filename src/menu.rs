// src/menu.rs

//! Context-menu model.
//!
//! The host file manager hands over the clicked location or the selected
//! files; this module decides which entries to offer. Activating an entry
//! yields a [`MenuAction`] that `actions` carries out.

use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// A location handed over by the file manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    uri: String,
    /// Local path; `None` for URIs outside the local filesystem.
    path: Option<PathBuf>,
}

impl FileItem {
    /// Accepts a URI (`file:///mnt/pool`) or a plain path (`/mnt/pool`).
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) => Self::from_url(&url),
            Err(_) => Self::from_path(location),
        }
    }

    pub fn from_url(url: &Url) -> Self {
        let path = if url.scheme() == "file" {
            url.to_file_path().ok()
        } else {
            None
        };
        Self {
            uri: url.to_string(),
            path,
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let uri = Url::from_file_path(&path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.display().to_string());
        Self {
            uri,
            path: Some(path),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for FileItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str(&self.uri),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    CreateSubvolume { directory: FileItem },
    DeleteSubvolumes { files: Vec<FileItem> },
    CreateSnapshot { file: FileItem },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Stable identifier the host registers the entry under.
    pub name: &'static str,
    pub label: &'static str,
    pub action: MenuAction,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.name, self.label)
    }
}

/// Entries for a right click on the background of `directory`.
pub fn background_items(directory: &FileItem) -> Vec<MenuItem> {
    vec![MenuItem {
        name: "BtrfsSnapshotExtension::create",
        label: "Create New Btrfs Subvolume",
        action: MenuAction::CreateSubvolume {
            directory: directory.clone(),
        },
    }]
}

/// Entries for a selection; snapshots are offered for one item only.
pub fn file_items(files: &[FileItem]) -> Vec<MenuItem> {
    if files.is_empty() {
        return Vec::new();
    }

    let mut items = vec![MenuItem {
        name: "BtrfsSnapshotExtension::delete",
        label: "Delete Btrfs Subvolume",
        action: MenuAction::DeleteSubvolumes {
            files: files.to_vec(),
        },
    }];

    if let [file] = files {
        items.push(MenuItem {
            name: "BtrfsSnapshotExtension::snapshot",
            label: "Create Btrfs Snapshot",
            action: MenuAction::CreateSnapshot { file: file.clone() },
        });
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_uris_are_decoded() {
        let item = FileItem::parse("file:///mnt/pool/my%20vol");
        assert_eq!(item.path(), Some(Path::new("/mnt/pool/my vol")));
        assert_eq!(item.uri(), "file:///mnt/pool/my%20vol");
    }

    #[test]
    fn plain_paths_are_accepted() {
        let item = FileItem::parse("/mnt/pool");
        assert_eq!(item.path(), Some(Path::new("/mnt/pool")));
        assert_eq!(item.uri(), "file:///mnt/pool");
    }

    #[test]
    fn remote_uris_have_no_path() {
        let item = FileItem::parse("sftp://host/mnt/pool");
        assert_eq!(item.path(), None);
        assert_eq!(item.to_string(), "sftp://host/mnt/pool");
    }

    #[test]
    fn empty_selection_offers_nothing() {
        assert!(file_items(&[]).is_empty());
    }

    #[test]
    fn snapshot_only_for_single_selection() {
        let one = file_items(&[FileItem::parse("/mnt/pool/a")]);
        let names: Vec<_> = one.iter().map(|i| i.name).collect();
        assert_eq!(
            names,
            ["BtrfsSnapshotExtension::delete", "BtrfsSnapshotExtension::snapshot"]
        );

        let two = file_items(&[FileItem::parse("/mnt/pool/a"), FileItem::parse("/mnt/pool/b")]);
        assert_eq!(two.len(), 1);
        assert_eq!(two[0].label, "Delete Btrfs Subvolume");
    }

    #[test]
    fn background_offers_create() {
        let items = background_items(&FileItem::parse("/mnt/pool"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "Create New Btrfs Subvolume");
        assert_eq!(
            items[0].action,
            MenuAction::CreateSubvolume {
                directory: FileItem::parse("/mnt/pool")
            }
        );
    }
}
