// src/actions.rs

//! What each menu entry does once activated.
//!
//! Creating subvolumes and snapshots asks for a name, then runs the helper
//! synchronously. Deleting asks for confirmation once, then starts one
//! asynchronous `helper delete` per selected item, each speaking the
//! confirmation protocol on its own.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::confirm::{ConfirmationProtocol, DeletionConfirmer};
use crate::dialog::{Dialog, DialogResponse};
use crate::engine::Supervisor;
use crate::exec::{Helper, HelperCommand};
use crate::menu::{FileItem, MenuAction};

pub const SUBVOLUME_NAME_TITLE: &str = "Enter Subvolume Name";
pub const SNAPSHOT_NAME_TITLE: &str = "Enter Snapshot Name";

/// Shown in dry runs when no name was given up front.
const NAME_PLACEHOLDER: &str = "<name>";

#[derive(Debug, Clone)]
pub struct Actions {
    helper: Helper,
    protocol: ConfirmationProtocol,
}

impl Actions {
    pub fn new(helper: Helper, protocol: ConfirmationProtocol) -> Self {
        Self { helper, protocol }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(
            Helper::new(cfg.helper.path.clone()),
            ConfirmationProtocol::from(&cfg.delete),
        )
    }

    pub fn helper(&self) -> &Helper {
        &self.helper
    }

    /// Carry out `action`. A `name` skips the name dialog.
    pub fn activate(&self, supervisor: &mut Supervisor, action: MenuAction, name: Option<String>) {
        info!(?action, "menu entry activated");
        match action {
            MenuAction::CreateSubvolume { directory } => {
                self.create_subvolume(supervisor, &directory, name)
            }
            MenuAction::CreateSnapshot { file } => self.create_snapshot(supervisor, &file, name),
            MenuAction::DeleteSubvolumes { files } => self.delete_subvolumes(supervisor, &files),
        }
    }

    pub fn create_subvolume(
        &self,
        supervisor: &mut Supervisor,
        directory: &FileItem,
        name: Option<String>,
    ) {
        let Some(dir) = local_path(directory) else {
            return;
        };
        let helper = self.helper.clone();
        let dir = dir.to_path_buf();
        with_name(supervisor, SUBVOLUME_NAME_TITLE, name, move |supervisor, name| {
            supervisor.run_blocking(helper.create_subvolume(&dir, &name));
        });
    }

    pub fn create_snapshot(&self, supervisor: &mut Supervisor, file: &FileItem, name: Option<String>) {
        let Some(source) = local_path(file) else {
            return;
        };
        if source.parent().is_none_or(|p| p.as_os_str().is_empty()) {
            warn!(%file, "snapshot source has no parent directory; skipped");
            return;
        }
        let helper = self.helper.clone();
        let source = source.to_path_buf();
        with_name(supervisor, SNAPSHOT_NAME_TITLE, name, move |supervisor, name| {
            match helper.create_snapshot(&source, &name) {
                Some(command) => supervisor.run_blocking(command),
                None => warn!(source = %source.display(), "snapshot source has no parent directory"),
            }
        });
    }

    /// Warn once, then start one delete per item on OK.
    pub fn delete_subvolumes(&self, supervisor: &mut Supervisor, files: &[FileItem]) {
        let commands: Vec<HelperCommand> = files
            .iter()
            .filter_map(local_path)
            .map(|path| self.helper.delete(path))
            .collect();
        if commands.is_empty() {
            return;
        }
        let protocol = self.protocol.clone();

        supervisor.open_dialog(Dialog::delete_warning(), move |supervisor, response| {
            if response != DialogResponse::Ok {
                debug!(?response, "deletion cancelled");
                return;
            }
            for command in commands {
                supervisor.run_non_blocking(command, DeletionConfirmer::new(protocol.clone()));
            }
        });
    }

    /// The helper invocations `action` would make, for dry runs.
    pub fn planned_commands(&self, action: &MenuAction, name: Option<&str>) -> Vec<HelperCommand> {
        let name = name.unwrap_or(NAME_PLACEHOLDER);
        match action {
            MenuAction::CreateSubvolume { directory } => directory
                .path()
                .map(|dir| self.helper.create_subvolume(dir, name))
                .into_iter()
                .collect(),
            MenuAction::CreateSnapshot { file } => file
                .path()
                .and_then(|source| self.helper.create_snapshot(source, name))
                .into_iter()
                .collect(),
            MenuAction::DeleteSubvolumes { files } => files
                .iter()
                .filter_map(|f| f.path())
                .map(|path| self.helper.delete(path))
                .collect(),
        }
    }
}

fn local_path(item: &FileItem) -> Option<&Path> {
    let path = item.path();
    if path.is_none() {
        warn!(uri = item.uri(), "not a local file; skipped");
    }
    path
}

/// Call `then` with `name`, or with whatever the user enters for it.
///
/// Any answer other than a submitted name closes the dialog and does
/// nothing.
fn with_name(
    supervisor: &mut Supervisor,
    title: &str,
    name: Option<String>,
    then: impl FnOnce(&mut Supervisor, String) + 'static,
) {
    if let Some(name) = name {
        then(supervisor, name);
        return;
    }

    supervisor.open_dialog(
        Dialog::NameEntry {
            title: title.to_string(),
        },
        move |supervisor, response| match response {
            DialogResponse::Submitted(name) => then(supervisor, name),
            other => debug!(response = ?other, "name entry cancelled"),
        },
    );
}
