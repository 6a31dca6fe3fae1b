// src/engine/mod.rs

//! Process supervision engine.
//!
//! This module ties together:
//! - the generational registries that keep async supervisors and open
//!   dialogs alive ([`registry`])
//! - the per-process state machine ([`state`]) and its output line
//!   assembly ([`assembler`])
//! - the supervisor itself, which reacts to stream events and dialog
//!   answers ([`core`])
//! - the async shell that feeds events into the supervisor on one control
//!   thread ([`runtime`])
//!
//! The supervisor performs no IO of its own: pipes and child processes
//! belong to a `ProcessBackend`, dialogs to a `DialogPresenter`. Both
//! report back through [`SupervisorEvent`]s.

pub mod assembler;
pub mod core;
pub mod registry;
pub mod runtime;
pub mod state;

use crate::dialog::DialogResponse;

pub use self::core::{HandlerContext, OutputHandler, Supervisor};
pub use registry::{SlotId, SlotRegistry};
pub use runtime::Runtime;
pub use state::{ProcessAction, ProcessFailure, ProcessMachine, ProcessState, StreamEvent};

/// Handle of a supervised process in the process registry.
pub type ProcessId = SlotId;

/// Handle of an open dialog in the dialog registry.
pub type DialogId = SlotId;

/// Events flowing into the supervisor from backends and presenters.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// A stream watch or the exit waiter of `process` observed something.
    Stream {
        process: ProcessId,
        event: StreamEvent,
    },
    /// The user answered a dialog.
    DialogResponse {
        dialog: DialogId,
        response: DialogResponse,
    },
}
