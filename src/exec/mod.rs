// src/exec/mod.rs

//! Helper process execution.
//!
//! - [`command`] builds the helper's argument vectors.
//! - [`backend`] provides the `ProcessBackend` trait and the
//!   `RealProcessBackend` used in production, which tests replace with a
//!   fake.
//! - [`pump`] contains the stream watches and the exit waiter that feed
//!   `SupervisorEvent`s back to the runtime.

pub mod backend;
pub mod command;
pub mod pump;

pub use backend::{
    ChildInput, CompletedProcess, ProcessBackend, RealProcessBackend, SpawnedProcess,
    StreamWatches,
};
pub use command::{Helper, HelperCommand, MalformedCommand};
