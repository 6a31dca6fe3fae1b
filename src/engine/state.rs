// src/engine/state.rs

//! Pure per-process state machine.
//!
//! A [`ProcessMachine`] consumes the stream events of one asynchronous child
//! and answers with [`ProcessAction`]s for the supervisor to carry out. It
//! performs no IO and holds no handles, so every transition can be unit
//! tested directly.
//!
//! ```text
//! Spawned ──started──▶ Running ──stdout EOF──▶ Draining ──exit 0──▶ Terminated
//!    │                    │                       │
//!    │ launch failed      │ stderr data           │ exit ≠ 0
//!    ▼                    ▼                       ▼
//!  Failed ◀───────────────┴───────────────────────┘
//!    │ failure dialog dismissed
//!    ▼
//! Terminated
//! ```

use tracing::{debug, warn};

use crate::engine::assembler::LineAssembler;
use crate::types::{StreamFault, StreamKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Registered, not yet attached to any watch.
    Spawned,
    /// Watches attached; stdout is delivered to the handler.
    Running,
    /// Stdout reached end-of-stream; waiting for the exit status.
    Draining,
    /// The process will be reported as failed (or already has been).
    Failed,
    Terminated,
}

/// Something a stream watch (or the exit waiter) observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Data(StreamKind, Vec<u8>),
    /// Empty read: the stream reached end-of-file.
    Closed(StreamKind),
    Fault(StreamKind, StreamFault),
    /// Exit code, `None` when the child was killed by a signal.
    Exited(Option<i32>),
}

/// User-visible failure of one helper invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessFailure {
    #[error("Cannot launch helper program {program}")]
    Launch { program: String },

    #[error("helper exited with {code:?}: {stderr}")]
    AbnormalExit { code: Option<i32>, stderr: String },
}

/// Work the supervisor must carry out after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessAction {
    /// Hand this text to the output handler.
    Deliver(String),
    /// Remove both stream watches.
    DetachWatches,
    /// Show a failure dialog; the process stays registered until it closes.
    ReportFailure(ProcessFailure),
    /// Drop the process from the registry.
    Release,
}

#[derive(Debug)]
pub struct ProcessMachine {
    state: ProcessState,
    assembler: LineAssembler,
    stderr: Vec<u8>,
    stdout_open: bool,
    stderr_open: bool,
    exit: Option<Option<i32>>,
    watches_attached: bool,
    reported: bool,
}

impl Default for ProcessMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMachine {
    pub fn new() -> Self {
        Self {
            state: ProcessState::Spawned,
            assembler: LineAssembler::new(),
            stderr: Vec::new(),
            stdout_open: true,
            stderr_open: true,
            exit: None,
            watches_attached: false,
            reported: false,
        }
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn watches_attached(&self) -> bool {
        self.watches_attached
    }

    /// Stderr captured so far, decoded.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// The backend attached both watches.
    pub fn started(&mut self) {
        if self.state == ProcessState::Spawned {
            self.state = ProcessState::Running;
            self.watches_attached = true;
        }
    }

    /// The backend could not launch the program.
    pub fn launch_failed(&mut self, program: &str) -> Vec<ProcessAction> {
        self.state = ProcessState::Failed;
        self.stdout_open = false;
        self.stderr_open = false;
        self.reported = true;
        vec![ProcessAction::ReportFailure(ProcessFailure::Launch {
            program: program.to_string(),
        })]
    }

    /// The failure dialog for this process was closed.
    pub fn failure_dismissed(&mut self) -> Vec<ProcessAction> {
        if self.state == ProcessState::Terminated {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.detach(&mut actions);
        self.state = ProcessState::Terminated;
        actions.push(ProcessAction::Release);
        actions
    }

    pub fn on_event(&mut self, event: StreamEvent) -> Vec<ProcessAction> {
        let mut actions = Vec::new();

        if self.state == ProcessState::Terminated {
            debug!(?event, "event for terminated process ignored");
            return actions;
        }

        match event {
            StreamEvent::Data(StreamKind::Stdout, bytes) => {
                if self.stdout_open && self.watches_attached {
                    actions.extend(self.assembler.push(&bytes).into_iter().map(ProcessAction::Deliver));
                }
            }
            StreamEvent::Data(StreamKind::Stderr, bytes) => {
                self.stderr.extend_from_slice(&bytes);
                if matches!(self.state, ProcessState::Running | ProcessState::Draining) {
                    self.state = ProcessState::Failed;
                }
            }
            StreamEvent::Closed(StreamKind::Stdout) => {
                if self.stdout_open {
                    self.stdout_open = false;
                    if let Some(rest) = self.assembler.finish() {
                        actions.push(ProcessAction::Deliver(rest));
                    }
                }
                if self.state == ProcessState::Running {
                    self.state = ProcessState::Draining;
                }
            }
            StreamEvent::Closed(StreamKind::Stderr) => {
                self.stderr_open = false;
            }
            StreamEvent::Fault(stream, fault) => {
                warn!(%stream, %fault, "stream watch faulted; detaching watches");
                self.stdout_open = false;
                self.stderr_open = false;
                self.detach(&mut actions);
                if self.state == ProcessState::Running {
                    self.state = ProcessState::Draining;
                }
            }
            StreamEvent::Exited(code) => {
                self.exit = Some(code);
            }
        }

        self.check_completion(&mut actions);
        actions
    }

    fn check_completion(&mut self, actions: &mut Vec<ProcessAction>) {
        let Some(code) = self.exit else {
            return;
        };

        match self.state {
            ProcessState::Spawned | ProcessState::Running | ProcessState::Terminated => {}
            ProcessState::Draining => {
                if code == Some(0) {
                    if self.stderr_open {
                        return;
                    }
                    self.detach(actions);
                    self.state = ProcessState::Terminated;
                    actions.push(ProcessAction::Release);
                } else {
                    self.state = ProcessState::Failed;
                    self.report_if_complete(code, actions);
                }
            }
            ProcessState::Failed => self.report_if_complete(code, actions),
        }
    }

    /// Report once stderr has been read to completion.
    fn report_if_complete(&mut self, code: Option<i32>, actions: &mut Vec<ProcessAction>) {
        if self.reported || self.stderr_open {
            return;
        }
        self.reported = true;
        self.detach(actions);
        actions.push(ProcessAction::ReportFailure(ProcessFailure::AbnormalExit {
            code,
            stderr: self.stderr_text(),
        }));
    }

    fn detach(&mut self, actions: &mut Vec<ProcessAction>) {
        if self.watches_attached {
            self.watches_attached = false;
            actions.push(ProcessAction::DetachWatches);
        }
    }
}
