// src/engine/core.rs

//! The supervisor: owner of every helper invocation and every open dialog.
//!
//! All methods run on the single control thread. Nothing in here blocks
//! except [`Supervisor::run_blocking`], which by contract holds the thread
//! until its child exits.
//!
//! Ownership model:
//! - an async process lives in the process registry from spawn until its
//!   teardown; a failed one stays until its failure dialog is dismissed;
//! - a dialog lives in the dialog registry from `present` until answered;
//!   confirmation prompts are additionally listed on their owning process
//!   and are withdrawn when that process is torn down.

use std::any::Any;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::confirm::{self, SessionMemory};
use crate::dialog::{Dialog, DialogPresenter, DialogResponse};
use crate::engine::registry::SlotRegistry;
use crate::engine::state::{ProcessAction, ProcessFailure, ProcessMachine, ProcessState};
use crate::engine::{DialogId, ProcessId, SupervisorEvent};
use crate::exec::{ChildInput, HelperCommand, ProcessBackend, StreamWatches};

/// Receives the output of an asynchronous helper, one line at a time.
///
/// `text` is passed verbatim, trailing newline included. The context gives
/// access to the process's user data, its stdin and the rest of the
/// supervisor (for prompts or further spawns).
pub trait OutputHandler {
    fn on_output(&mut self, ctx: &mut HandlerContext<'_>, text: &str);
}

impl<F> OutputHandler for F
where
    F: FnMut(&mut HandlerContext<'_>, &str),
{
    fn on_output(&mut self, ctx: &mut HandlerContext<'_>, text: &str) {
        self(ctx, text)
    }
}

/// Called with the answer of a dialog opened through [`Supervisor::open_dialog`].
pub type DialogContinuation = Box<dyn FnOnce(&mut Supervisor, DialogResponse)>;

enum DialogPurpose {
    /// Failure report; closing it releases `owner` (if still registered).
    Failure { owner: Option<ProcessId> },
    /// Per-item deletion prompt; the answer goes to `owner`'s stdin.
    Confirmation { owner: ProcessId },
    Continuation(DialogContinuation),
}

struct OpenDialog {
    dialog: Dialog,
    purpose: DialogPurpose,
}

struct SupervisedProcess {
    command: HelperCommand,
    machine: ProcessMachine,
    handler: Option<Box<dyn OutputHandler>>,
    stdin: Option<Box<dyn ChildInput>>,
    watches: Option<Box<dyn StreamWatches>>,
    prompts: Vec<DialogId>,
    session: SessionMemory,
    data: Option<Box<dyn Any>>,
}

impl SupervisedProcess {
    fn new(command: HelperCommand, handler: Option<Box<dyn OutputHandler>>) -> Self {
        Self {
            command,
            machine: ProcessMachine::new(),
            handler,
            stdin: None,
            watches: None,
            prompts: Vec::new(),
            session: SessionMemory::default(),
            data: None,
        }
    }
}

pub struct Supervisor {
    processes: SlotRegistry<SupervisedProcess>,
    dialogs: SlotRegistry<OpenDialog>,
    backend: Box<dyn ProcessBackend>,
    presenter: Box<dyn DialogPresenter>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("processes", &self.processes.len())
            .field("dialogs", &self.dialogs.len())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        backend: impl ProcessBackend + 'static,
        presenter: impl DialogPresenter + 'static,
    ) -> Self {
        Self {
            processes: SlotRegistry::new(),
            dialogs: SlotRegistry::new(),
            backend: Box::new(backend),
            presenter: Box::new(presenter),
        }
    }

    /// No process is registered and no dialog is waiting for an answer.
    pub fn is_idle(&self) -> bool {
        self.processes.is_empty() && self.dialogs.is_empty()
    }

    pub fn live_processes(&self) -> usize {
        self.processes.len()
    }

    pub fn process_ids(&self) -> Vec<ProcessId> {
        self.processes.ids()
    }

    /// Slots ever allocated in the process registry.
    pub fn process_capacity(&self) -> usize {
        self.processes.capacity()
    }

    pub fn process_state(&self, id: ProcessId) -> Option<ProcessState> {
        self.processes.get(id).map(|p| p.machine.state())
    }

    pub fn session(&self, id: ProcessId) -> Option<SessionMemory> {
        self.processes.get(id).map(|p| p.session)
    }

    pub fn open_dialogs(&self) -> usize {
        self.dialogs.len()
    }

    pub fn dialog_ids(&self) -> Vec<DialogId> {
        self.dialogs.ids()
    }

    pub fn dialog(&self, id: DialogId) -> Option<&Dialog> {
        self.dialogs.get(id).map(|d| &d.dialog)
    }

    /// Run `command` to completion on the calling thread.
    ///
    /// Launch failures and non-zero exits are reported in an error dialog;
    /// a malformed command is only logged. The process slot is released
    /// before returning whatever the outcome.
    pub fn run_blocking(&mut self, command: HelperCommand) {
        if let Err(e) = command.validate() {
            warn!(%command, error = %e, "helper called with invalid arguments");
            return;
        }

        let id = self
            .processes
            .acquire(SupervisedProcess::new(command.clone(), None));
        info!(process = %id, %command, "running helper to completion");

        let failure = match self.backend.run_to_completion(&command) {
            Err(e) => {
                warn!(process = %id, program = %command.program_name(), error = %e, "cannot launch helper");
                Some(ProcessFailure::Launch {
                    program: command.program_name(),
                })
            }
            Ok(done) if done.success() => {
                debug!(process = %id, "helper finished successfully");
                None
            }
            Ok(done) => {
                warn!(process = %id, exit_code = ?done.code, "helper exited abnormally");
                Some(ProcessFailure::AbnormalExit {
                    code: done.code,
                    stderr: String::from_utf8_lossy(&done.stderr).into_owned(),
                })
            }
        };

        self.teardown(id);

        if let Some(failure) = failure {
            self.open_failure_dialog(&failure, None);
        }
    }

    /// Spawn `command` without waiting for it; its stdout goes to `handler`.
    ///
    /// Returns the process handle, or `None` for a malformed command. A
    /// launch failure still returns a handle: the process stays registered
    /// until its failure dialog is dismissed.
    pub fn run_non_blocking(
        &mut self,
        command: HelperCommand,
        handler: impl OutputHandler + 'static,
    ) -> Option<ProcessId> {
        if let Err(e) = command.validate() {
            warn!(%command, error = %e, "helper called with invalid arguments");
            return None;
        }

        let id = self.processes.acquire(SupervisedProcess::new(
            command.clone(),
            Some(Box::new(handler)),
        ));

        match self.backend.spawn(id, &command) {
            Ok(spawned) => {
                info!(process = %id, %command, "helper spawned");
                if let Some(p) = self.processes.get_mut(id) {
                    p.stdin = Some(spawned.stdin);
                    p.watches = Some(spawned.watches);
                    p.machine.started();
                }
            }
            Err(e) => {
                warn!(process = %id, program = %command.program_name(), error = %e, "cannot launch helper");
                let actions = match self.processes.get_mut(id) {
                    Some(p) => p.machine.launch_failed(&command.program_name()),
                    None => Vec::new(),
                };
                self.apply(id, actions);
            }
        }

        Some(id)
    }

    /// Show `dialog` and call `then` with the user's answer.
    pub fn open_dialog(
        &mut self,
        dialog: Dialog,
        then: impl FnOnce(&mut Supervisor, DialogResponse) + 'static,
    ) -> DialogId {
        self.present(dialog, DialogPurpose::Continuation(Box::new(then)))
    }

    pub fn handle_event(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Stream { process, event } => {
                let Some(p) = self.processes.get_mut(process) else {
                    debug!(process = %process, ?event, "event for released process ignored");
                    return;
                };
                let actions = p.machine.on_event(event);
                self.apply(process, actions);
            }
            SupervisorEvent::DialogResponse { dialog, response } => {
                self.handle_dialog_response(dialog, response)
            }
        }
    }

    /// Detach watches, withdraw open prompts and free the slot of `id`.
    ///
    /// Safe to call any number of times; only the first call has an effect.
    pub fn teardown(&mut self, id: ProcessId) {
        self.detach_watches(id);

        let Some(process) = self.processes.release(id) else {
            debug!(process = %id, "teardown of already released process");
            return;
        };

        for prompt in process.prompts {
            if self.dialogs.release(prompt).is_some() {
                self.presenter.dismiss(prompt);
            }
        }

        info!(process = %id, command = %process.command, "process released");
    }

    fn apply(&mut self, id: ProcessId, actions: Vec<ProcessAction>) {
        for action in actions {
            match action {
                ProcessAction::Deliver(text) => self.deliver(id, &text),
                ProcessAction::DetachWatches => self.detach_watches(id),
                ProcessAction::ReportFailure(failure) => {
                    error!(process = %id, %failure, "helper failed");
                    self.open_failure_dialog(&failure, Some(id));
                }
                ProcessAction::Release => self.teardown(id),
            }
        }
    }

    fn deliver(&mut self, id: ProcessId, text: &str) {
        let Some(mut handler) = self.processes.get_mut(id).and_then(|p| p.handler.take()) else {
            debug!(process = %id, "no handler for output; dropped");
            return;
        };

        // The handler is taken out for the call, but the process keeps its
        // slot, so anything spawned from inside the handler gets a new one.
        handler.on_output(
            &mut HandlerContext {
                supervisor: self,
                process: id,
            },
            text,
        );

        if let Some(p) = self.processes.get_mut(id) {
            p.handler = Some(handler);
        }
    }

    fn detach_watches(&mut self, id: ProcessId) {
        if let Some(mut watches) = self.processes.get_mut(id).and_then(|p| p.watches.take()) {
            watches.detach();
            debug!(process = %id, "stream watches detached");
        }
    }

    fn write_stdin(&mut self, id: ProcessId, bytes: &[u8]) -> bool {
        let Some(stdin) = self.processes.get_mut(id).and_then(|p| p.stdin.as_mut()) else {
            warn!(process = %id, "no stdin to write to");
            return false;
        };
        match stdin.send(bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!(process = %id, error = %e, "writing to helper stdin failed");
                false
            }
        }
    }

    fn open_confirmation(&mut self, owner: ProcessId, item: String) -> Option<DialogId> {
        if !self.processes.contains(owner) {
            return None;
        }
        let id = self.present(
            Dialog::ConfirmDeletion { item },
            DialogPurpose::Confirmation { owner },
        );
        if let Some(p) = self.processes.get_mut(owner) {
            p.prompts.push(id);
        }
        Some(id)
    }

    fn open_failure_dialog(&mut self, failure: &ProcessFailure, owner: Option<ProcessId>) {
        self.present(Dialog::for_failure(failure), DialogPurpose::Failure { owner });
    }

    fn present(&mut self, dialog: Dialog, purpose: DialogPurpose) -> DialogId {
        let id = self.dialogs.acquire(OpenDialog {
            dialog: dialog.clone(),
            purpose,
        });
        debug!(dialog = %id, title = dialog.title(), "presenting dialog");
        self.presenter.present(id, &dialog);
        id
    }

    fn handle_dialog_response(&mut self, id: DialogId, response: DialogResponse) {
        let Some(open) = self.dialogs.release(id) else {
            debug!(dialog = %id, ?response, "answer for closed dialog ignored");
            return;
        };
        debug!(dialog = %id, ?response, "dialog answered");

        match open.purpose {
            DialogPurpose::Failure { owner: Some(owner) } => {
                let actions = match self.processes.get_mut(owner) {
                    Some(p) => p.machine.failure_dismissed(),
                    None => Vec::new(),
                };
                self.apply(owner, actions);
            }
            DialogPurpose::Failure { owner: None } => {}
            DialogPurpose::Confirmation { owner } => {
                let Some(p) = self.processes.get_mut(owner) else {
                    debug!(dialog = %id, process = %owner, "prompt owner already gone");
                    return;
                };
                p.prompts.retain(|d| *d != id);
                let answer = confirm::resolve(&response, &mut p.session);
                debug!(process = %owner, ?answer, "answering deletion prompt");
                self.write_stdin(owner, answer.as_line());
            }
            DialogPurpose::Continuation(then) => then(self, response),
        }
    }
}

/// View of the supervisor handed to an [`OutputHandler`].
pub struct HandlerContext<'a> {
    supervisor: &'a mut Supervisor,
    process: ProcessId,
}

impl HandlerContext<'_> {
    pub fn process(&self) -> ProcessId {
        self.process
    }

    pub fn command(&self) -> Option<&HelperCommand> {
        self.supervisor
            .processes
            .get(self.process)
            .map(|p| &p.command)
    }

    /// User data previously stored on this process, if it has type `T`.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.supervisor
            .processes
            .get(self.process)
            .and_then(|p| p.data.as_ref())
            .and_then(|d| d.downcast_ref::<T>())
    }

    pub fn set_data<T: Any>(&mut self, value: T) {
        if let Some(p) = self.supervisor.processes.get_mut(self.process) {
            p.data = Some(Box::new(value));
        }
    }

    pub fn session(&self) -> SessionMemory {
        self.supervisor
            .session(self.process)
            .unwrap_or_default()
    }

    /// Queue `bytes` for the child's stdin. Returns `false` if it is gone.
    pub fn write_stdin(&mut self, bytes: &[u8]) -> bool {
        self.supervisor.write_stdin(self.process, bytes)
    }

    /// Open a deletion prompt owned by this process.
    pub fn open_confirmation(&mut self, item: impl Into<String>) -> Option<DialogId> {
        self.supervisor.open_confirmation(self.process, item.into())
    }

    /// The whole supervisor, e.g. to start another helper.
    pub fn supervisor(&mut self) -> &mut Supervisor {
        self.supervisor
    }
}
