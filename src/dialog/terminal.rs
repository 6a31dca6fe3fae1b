// src/dialog/terminal.rs

//! Terminal rendering of dialogs via `dialoguer`.
//!
//! Prompts are blocking reads from the terminal, so they run on a
//! dedicated `dialogs` thread. Requests are queued and shown one at a
//! time, which keeps them modal the way toolkit dialogs are; answers are
//! sent back into the runtime's event channel. A dialog dismissed while
//! still queued is never shown.

use std::collections::HashSet;
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result};
use dialoguer::{Input, Select};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dialog::{Dialog, DialogPresenter, DialogResponse};
use crate::engine::{DialogId, SupervisorEvent};

const OK_CANCEL: [&str; 2] = ["OK", "Cancel"];
const DELETE_CHOICES: [&str; 3] = ["Yes", "Yes to All", "No"];

pub struct TerminalPresenter {
    requests: std_mpsc::Sender<(DialogId, Dialog)>,
    queued: QueuedDialogs,
}

/// Dialogs sent to the dialog thread but not yet picked up.
#[derive(Debug, Clone, Default)]
struct QueuedDialogs(Arc<Mutex<HashSet<DialogId>>>);

impl QueuedDialogs {
    fn insert(&self, id: DialogId) {
        if let Ok(mut queued) = self.0.lock() {
            queued.insert(id);
        }
    }

    fn withdraw(&self, id: DialogId) {
        if let Ok(mut queued) = self.0.lock() {
            queued.remove(&id);
        }
    }

    /// Take `id` off the queue; false if it was withdrawn meanwhile.
    fn claim(&self, id: DialogId) -> bool {
        self.0.lock().map(|mut q| q.remove(&id)).unwrap_or(true)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.0.lock().map(|q| q.len()).unwrap_or(0)
    }
}

impl TerminalPresenter {
    /// Start the dialog thread, answering into `events`.
    pub fn spawn(events: mpsc::Sender<SupervisorEvent>) -> Result<Self> {
        let (requests, rx) = std_mpsc::channel::<(DialogId, Dialog)>();
        let queued = QueuedDialogs::default();
        let thread_queued = queued.clone();

        thread::Builder::new()
            .name("dialogs".to_string())
            .spawn(move || dialog_loop(rx, events, thread_queued))
            .context("spawning dialog thread")?;

        Ok(Self { requests, queued })
    }
}

impl DialogPresenter for TerminalPresenter {
    fn present(&mut self, id: DialogId, dialog: &Dialog) {
        self.queued.insert(id);
        if self.requests.send((id, dialog.clone())).is_err() {
            warn!(dialog = %id, "dialog thread is gone; dialog not shown");
            self.queued.withdraw(id);
        }
    }

    fn dismiss(&mut self, id: DialogId) {
        self.queued.withdraw(id);
    }
}

fn dialog_loop(
    rx: std_mpsc::Receiver<(DialogId, Dialog)>,
    events: mpsc::Sender<SupervisorEvent>,
    queued: QueuedDialogs,
) {
    for (id, dialog) in rx {
        if !queued.claim(id) {
            debug!(dialog = %id, "skipping dismissed dialog");
            continue;
        }

        let response = show(&dialog).unwrap_or_else(|e| {
            warn!(dialog = %id, error = %e, "dialog failed; treating as closed");
            DialogResponse::Closed
        });

        if events
            .blocking_send(SupervisorEvent::DialogResponse { dialog: id, response })
            .is_err()
        {
            debug!("runtime stopped listening; dialog thread exiting");
            break;
        }
    }
}

fn show(dialog: &Dialog) -> Result<DialogResponse> {
    match dialog {
        Dialog::Error { text, secondary } | Dialog::Warning { text, secondary } => {
            if !secondary.is_empty() {
                eprintln!("{}", secondary.trim_end());
            }
            let choice = Select::new()
                .with_prompt(text.as_str())
                .items(&OK_CANCEL)
                .default(0)
                .interact_opt()
                .context("failed to read dialog answer")?;
            Ok(match choice {
                Some(0) => DialogResponse::Ok,
                Some(_) => DialogResponse::Cancel,
                None => DialogResponse::Closed,
            })
        }
        Dialog::ConfirmDeletion { item } => {
            eprintln!("Confirm deletion");
            let choice = Select::new()
                .with_prompt(item.trim_end())
                .items(&DELETE_CHOICES)
                .default(2)
                .interact_opt()
                .context("failed to read deletion answer")?;
            Ok(match choice {
                Some(0) => DialogResponse::Yes,
                Some(1) => DialogResponse::YesToAll,
                Some(_) => DialogResponse::No,
                None => DialogResponse::Closed,
            })
        }
        Dialog::NameEntry { title } => {
            let name: String = Input::new()
                .with_prompt(title.as_str())
                .allow_empty(true)
                .interact_text()
                .context("failed to read name")?;
            Ok(DialogResponse::Submitted(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SlotRegistry;

    #[test]
    fn dismissing_a_queued_dialog_skips_it() {
        let mut ids = SlotRegistry::new();
        let id = ids.acquire(());
        let queued = QueuedDialogs::default();

        queued.insert(id);
        queued.withdraw(id);
        assert!(!queued.claim(id));
        assert_eq!(queued.len(), 0);
    }

    #[test]
    fn answered_dialogs_leave_nothing_behind() {
        let mut ids = SlotRegistry::new();
        let queued = QueuedDialogs::default();

        for _ in 0..3 {
            let id = ids.acquire(());
            queued.insert(id);
            assert!(queued.claim(id));
            // Teardown dismisses dialogs that were already answered.
            queued.withdraw(id);
            ids.release(id);
        }
        assert_eq!(queued.len(), 0);
    }
}
