// src/exec/backend.rs

//! Pluggable process backend.
//!
//! The supervisor talks to a `ProcessBackend` instead of spawning children
//! itself. Production code uses [`RealProcessBackend`]; tests provide a
//! fake that records invocations and lets them inject stream events.

use std::io;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::OutputSection;
use crate::engine::{ProcessId, SupervisorEvent};
use crate::types::StreamKind;

use super::command::HelperCommand;
use super::pump::{pump, wait_for_exit};

/// Result of a helper run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedProcess {
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CompletedProcess {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Write side of a child's stdin. Sending must not block.
pub trait ChildInput {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// The readiness watches of a child's stdout and stderr.
pub trait StreamWatches {
    /// Stop watching both streams. Idempotent.
    fn detach(&mut self);
}

/// Handles of a freshly spawned child.
pub struct SpawnedProcess {
    pub stdin: Box<dyn ChildInput>,
    pub watches: Box<dyn StreamWatches>,
}

/// How helpers are actually launched.
pub trait ProcessBackend {
    /// Run `command` with stdin closed and wait for it, capturing both
    /// output streams. An `Err` means the program could not be launched.
    fn run_to_completion(&mut self, command: &HelperCommand) -> io::Result<CompletedProcess>;

    /// Launch `command` with all three streams piped and start watching its
    /// output. Everything observed is reported as
    /// `SupervisorEvent::Stream { process: id, .. }`.
    fn spawn(&mut self, id: ProcessId, command: &HelperCommand) -> io::Result<SpawnedProcess>;
}

/// Backend spawning real OS processes on the tokio runtime.
#[derive(Debug, Clone)]
pub struct RealProcessBackend {
    events: mpsc::Sender<SupervisorEvent>,
    output: OutputSection,
}

impl RealProcessBackend {
    pub fn new(events: mpsc::Sender<SupervisorEvent>, output: OutputSection) -> Self {
        Self { events, output }
    }
}

fn empty_command() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "empty helper command")
}

impl ProcessBackend for RealProcessBackend {
    fn run_to_completion(&mut self, command: &HelperCommand) -> io::Result<CompletedProcess> {
        let program = command.program().ok_or_else(empty_command)?;
        let output = std::process::Command::new(program)
            .args(command.args())
            .stdin(Stdio::null())
            .output()?;

        debug!(
            %command,
            exit_code = ?output.status.code(),
            stdout_len = output.stdout.len(),
            stderr_len = output.stderr.len(),
            "helper ran to completion"
        );

        Ok(CompletedProcess {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn spawn(&mut self, id: ProcessId, command: &HelperCommand) -> io::Result<SpawnedProcess> {
        let program = command.program().ok_or_else(empty_command)?;
        let mut child = Command::new(program)
            .args(command.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let (Some(stdin), Some(stdout), Some(stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            return Err(io::Error::other("child pipes were not captured"));
        };

        debug!(process = %id, pid = ?child.id(), "child spawned; attaching watches");

        let watches = TaskWatches {
            handles: vec![
                tokio::spawn(pump(
                    stdout,
                    id,
                    StreamKind::Stdout,
                    self.events.clone(),
                    self.output,
                )),
                tokio::spawn(pump(
                    stderr,
                    id,
                    StreamKind::Stderr,
                    self.events.clone(),
                    self.output,
                )),
            ],
        };

        tokio::spawn(wait_for_exit(child, id, self.events.clone()));

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(feed_stdin(stdin, rx, id));

        Ok(SpawnedProcess {
            stdin: Box::new(ChannelInput { tx }),
            watches: Box::new(watches),
        })
    }
}

/// Stdin writes queued to a writer task.
///
/// Dropping it ends the writer, which closes the child's stdin.
struct ChannelInput {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl ChildInput for ChannelInput {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "stdin writer has stopped"))
    }
}

async fn feed_stdin(
    mut stdin: ChildStdin,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    process: ProcessId,
) {
    while let Some(bytes) = rx.recv().await {
        let written = match stdin.write_all(&bytes).await {
            Ok(()) => stdin.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(%process, error = %e, "writing to child stdin failed");
            return;
        }
    }
    debug!(%process, "stdin closed");
}

struct TaskWatches {
    handles: Vec<JoinHandle<()>>,
}

impl StreamWatches for TaskWatches {
    fn detach(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}
