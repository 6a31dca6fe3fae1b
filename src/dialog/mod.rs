// src/dialog/mod.rs

//! Modal dialogs, described independently of any toolkit.
//!
//! The supervisor decides *what* to ask; a [`DialogPresenter`] decides how
//! to show it. Presenting never blocks the event loop: the answer comes
//! back later as a `SupervisorEvent::DialogResponse` carrying the same
//! [`DialogId`].
//!
//! - [`terminal`] renders dialogs on the controlling terminal.

pub mod terminal;

use crate::engine::DialogId;
use crate::engine::ProcessFailure;

pub use terminal::TerminalPresenter;

/// Title of every failure dialog raised for a launch failure.
pub const LAUNCH_FAILURE_TEXT: &str = "Failed to complete the operation";
/// Title of every failure dialog raised for an abnormal exit.
pub const EXIT_FAILURE_TEXT: &str = "Failed to complete the operation.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Error message with OK / Cancel; either button dismisses it.
    Error { text: String, secondary: String },
    /// Warning with OK / Cancel.
    Warning { text: String, secondary: String },
    /// "Confirm deletion" with Yes / Yes to All / No.
    ConfirmDeletion { item: String },
    /// Single text entry with OK / CANCEL; Enter in the entry counts as OK.
    NameEntry { title: String },
}

impl Dialog {
    pub fn for_failure(failure: &ProcessFailure) -> Self {
        match failure {
            ProcessFailure::Launch { program } => Dialog::Error {
                text: LAUNCH_FAILURE_TEXT.to_string(),
                secondary: format!("Cannot launch helper program {program}"),
            },
            ProcessFailure::AbnormalExit { stderr, .. } => Dialog::Error {
                text: EXIT_FAILURE_TEXT.to_string(),
                secondary: stderr.clone(),
            },
        }
    }

    pub fn delete_warning() -> Self {
        Dialog::Warning {
            text: "Are you sure you want to delete this subvolume?".to_string(),
            secondary: "This action cannot be reverted.".to_string(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Dialog::Error { text, .. } | Dialog::Warning { text, .. } => text,
            Dialog::ConfirmDeletion { .. } => "Confirm deletion",
            Dialog::NameEntry { title } => title,
        }
    }

    pub fn secondary(&self) -> Option<&str> {
        match self {
            Dialog::Error { secondary, .. } | Dialog::Warning { secondary, .. } => Some(secondary),
            Dialog::ConfirmDeletion { item } => Some(item),
            Dialog::NameEntry { .. } => None,
        }
    }
}

/// What the user did with a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogResponse {
    Ok,
    Cancel,
    Yes,
    YesToAll,
    No,
    /// Entry text, from OK or from Enter in the entry.
    Submitted(String),
    /// Closed without choosing a button.
    Closed,
}

/// Shows dialogs to the user.
///
/// Implementations must not wait for the answer inside `present`; they
/// report it later through the runtime's event channel.
pub trait DialogPresenter {
    fn present(&mut self, id: DialogId, dialog: &Dialog);

    /// Withdraw a dialog that no longer needs an answer.
    fn dismiss(&mut self, id: DialogId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_failure_names_the_program() {
        let dialog = Dialog::for_failure(&ProcessFailure::Launch {
            program: "/usr/local/bin/nautilus-btrfs".into(),
        });
        assert_eq!(dialog.title(), "Failed to complete the operation");
        assert_eq!(
            dialog.secondary(),
            Some("Cannot launch helper program /usr/local/bin/nautilus-btrfs")
        );
    }

    #[test]
    fn abnormal_exit_echoes_stderr() {
        let dialog = Dialog::for_failure(&ProcessFailure::AbnormalExit {
            code: Some(4),
            stderr: "Error creating subvolume!\n".into(),
        });
        assert_eq!(dialog.title(), "Failed to complete the operation.");
        assert_eq!(dialog.secondary(), Some("Error creating subvolume!\n"));
    }
}
