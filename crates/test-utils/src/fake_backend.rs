use std::collections::{HashSet, VecDeque};
use std::ffi::OsString;
use std::io;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use subvolmenu::engine::{ProcessId, StreamEvent, SupervisorEvent};
use subvolmenu::exec::{
    ChildInput, CompletedProcess, HelperCommand, ProcessBackend, SpawnedProcess, StreamWatches,
};

#[derive(Default)]
struct FakeState {
    blocking: Vec<HelperCommand>,
    spawned: Vec<(ProcessId, HelperCommand)>,
    stdin: Vec<(ProcessId, Vec<u8>)>,
    detached: Vec<ProcessId>,
    outcomes: VecDeque<CompletedProcess>,
    scripts: VecDeque<Vec<StreamEvent>>,
    missing: HashSet<OsString>,
}

/// A fake process backend that:
/// - records every blocking run, spawn, stdin write and watch detach
/// - answers blocking runs from a queue of outcomes (success by default)
/// - optionally replays a scripted list of stream events for each spawn
///   into the runtime channel.
///
/// Clones share their records, so a test keeps one clone for assertions
/// and hands the other to the supervisor.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    events: Option<mpsc::Sender<SupervisorEvent>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay scripted spawn events into `events`.
    pub fn with_events(mut self, events: mpsc::Sender<SupervisorEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Launching `program` fails with `NotFound`.
    pub fn with_missing_program(self, program: &str) -> Self {
        self.state.lock().unwrap().missing.insert(program.into());
        self
    }

    /// Outcome of the next blocking run.
    pub fn push_outcome(&self, outcome: CompletedProcess) {
        self.state.lock().unwrap().outcomes.push_back(outcome);
    }

    /// Events replayed after the next successful spawn.
    pub fn push_script(&self, events: Vec<StreamEvent>) {
        self.state.lock().unwrap().scripts.push_back(events);
    }

    pub fn blocking_commands(&self) -> Vec<Vec<String>> {
        let state = self.state.lock().unwrap();
        state.blocking.iter().map(|c| c.argv_lossy()).collect()
    }

    pub fn spawned(&self) -> Vec<(ProcessId, Vec<String>)> {
        let state = self.state.lock().unwrap();
        state
            .spawned
            .iter()
            .map(|(id, c)| (*id, c.argv_lossy()))
            .collect()
    }

    pub fn spawned_ids(&self) -> Vec<ProcessId> {
        self.spawned().into_iter().map(|(id, _)| id).collect()
    }

    /// Everything written to the stdin of `id`, decoded.
    pub fn stdin_of(&self, id: ProcessId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .stdin
            .iter()
            .filter(|(p, _)| *p == id)
            .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    pub fn stdin_write_count(&self) -> usize {
        self.state.lock().unwrap().stdin.len()
    }

    pub fn detach_count(&self, id: ProcessId) -> usize {
        let state = self.state.lock().unwrap();
        state.detached.iter().filter(|p| **p == id).count()
    }
}

/// Exit status `code` with `stderr` captured.
pub fn exited(code: i32, stderr: &str) -> CompletedProcess {
    CompletedProcess {
        code: Some(code),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

fn check_missing(state: &FakeState, command: &HelperCommand) -> io::Result<()> {
    match command.program() {
        Some(program) if state.missing.contains(program) => Err(io::Error::new(
            io::ErrorKind::NotFound,
            "No such file or directory",
        )),
        Some(_) => Ok(()),
        None => Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command")),
    }
}

impl ProcessBackend for FakeBackend {
    fn run_to_completion(&mut self, command: &HelperCommand) -> io::Result<CompletedProcess> {
        let mut state = self.state.lock().unwrap();
        state.blocking.push(command.clone());
        check_missing(&state, command)?;
        Ok(state.outcomes.pop_front().unwrap_or_else(|| exited(0, "")))
    }

    fn spawn(&mut self, id: ProcessId, command: &HelperCommand) -> io::Result<SpawnedProcess> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.spawned.push((id, command.clone()));
            check_missing(&state, command)?;
            state.scripts.pop_front()
        };

        if let (Some(events), Some(script)) = (&self.events, script) {
            for event in script {
                events
                    .try_send(SupervisorEvent::Stream { process: id, event })
                    .expect("event channel full or closed");
            }
        }

        Ok(SpawnedProcess {
            stdin: Box::new(FakeStdin {
                id,
                state: Arc::clone(&self.state),
            }),
            watches: Box::new(FakeWatches {
                id,
                state: Arc::clone(&self.state),
            }),
        })
    }
}

struct FakeStdin {
    id: ProcessId,
    state: Arc<Mutex<FakeState>>,
}

impl ChildInput for FakeStdin {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.state
            .lock()
            .unwrap()
            .stdin
            .push((self.id, bytes.to_vec()));
        Ok(())
    }
}

struct FakeWatches {
    id: ProcessId,
    state: Arc<Mutex<FakeState>>,
}

impl StreamWatches for FakeWatches {
    fn detach(&mut self) {
        self.state.lock().unwrap().detached.push(self.id);
    }
}
