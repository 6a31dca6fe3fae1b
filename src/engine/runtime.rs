// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::SupervisorEvent;
use super::core::Supervisor;

/// Feeds `SupervisorEvent`s into a [`Supervisor`] until it has nothing left
/// to do.
///
/// This is the only async part of the engine: it waits on the event channel
/// that backends and presenters write to, and hands each event to the
/// supervisor on the calling task. It stops once no process is registered
/// and no dialog is open, or when every sender is gone.
pub struct Runtime {
    supervisor: Supervisor,
    event_rx: mpsc::Receiver<SupervisorEvent>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("supervisor", &self.supervisor)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(supervisor: Supervisor, event_rx: mpsc::Receiver<SupervisorEvent>) -> Self {
        Self {
            supervisor,
            event_rx,
        }
    }

    pub fn supervisor_mut(&mut self) -> &mut Supervisor {
        &mut self.supervisor
    }

    /// Main event loop. Returns the supervisor for inspection.
    pub async fn run(mut self) -> Supervisor {
        info!("subvolmenu runtime started");

        while !self.supervisor.is_idle() {
            let Some(event) = self.event_rx.recv().await else {
                warn!(
                    processes = self.supervisor.live_processes(),
                    dialogs = self.supervisor.open_dialogs(),
                    "event channel closed with work pending; exiting"
                );
                break;
            };

            debug!(?event, "runtime received event");
            self.supervisor.handle_event(event);
        }

        info!("nothing left to supervise; runtime exiting");
        self.supervisor
    }
}
