// src/exec/pump.rs

//! Stream watches and exit waiting for asynchronously spawned helpers.
//!
//! A pump waits until its stream is readable, then drains everything that
//! is immediately available (up to `max_burst_bytes`) and forwards it as a
//! single `Data` event. Lines are not split here; that happens in the
//! supervisor's line assembler.

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::OutputSection;
use crate::engine::{ProcessId, StreamEvent, SupervisorEvent};
use crate::types::{StreamFault, StreamKind};

enum BurstEnd {
    /// The next read would block.
    Pending,
    Eof,
    Fault(StreamFault),
}

pub(crate) async fn pump<R>(
    mut reader: R,
    process: ProcessId,
    stream: StreamKind,
    events: mpsc::Sender<SupervisorEvent>,
    output: OutputSection,
) where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; output.read_chunk_size];

    loop {
        let first = match reader.read(&mut chunk).await {
            Ok(0) => {
                debug!(%process, %stream, "end of stream");
                send(&events, process, StreamEvent::Closed(stream)).await;
                return;
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let fault = StreamFault::from_io_error(&e);
                warn!(%process, %stream, error = %e, %fault, "stream read failed");
                send(&events, process, StreamEvent::Fault(stream, fault)).await;
                return;
            }
        };

        let mut burst = chunk[..first].to_vec();
        let end = drain_ready(&mut reader, &mut chunk, &mut burst, output.max_burst_bytes);

        if !send(&events, process, StreamEvent::Data(stream, burst)).await {
            return;
        }

        match end {
            BurstEnd::Pending => {}
            BurstEnd::Eof => {
                debug!(%process, %stream, "end of stream");
                send(&events, process, StreamEvent::Closed(stream)).await;
                return;
            }
            BurstEnd::Fault(fault) => {
                send(&events, process, StreamEvent::Fault(stream, fault)).await;
                return;
            }
        }
    }
}

/// Append everything readable without waiting to `burst`.
fn drain_ready<R>(reader: &mut R, chunk: &mut [u8], burst: &mut Vec<u8>, max: usize) -> BurstEnd
where
    R: AsyncRead + Unpin,
{
    while burst.len() < max {
        let room = (max - burst.len()).min(chunk.len());
        match reader.read(&mut chunk[..room]).now_or_never() {
            None => return BurstEnd::Pending,
            Some(Ok(0)) => return BurstEnd::Eof,
            Some(Ok(n)) => burst.extend_from_slice(&chunk[..n]),
            Some(Err(e)) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Some(Err(e)) => {
                warn!(error = %e, "stream read failed mid-burst");
                return BurstEnd::Fault(StreamFault::from_io_error(&e));
            }
        }
    }
    BurstEnd::Pending
}

pub(crate) async fn wait_for_exit(
    mut child: Child,
    process: ProcessId,
    events: mpsc::Sender<SupervisorEvent>,
) {
    let code = match child.wait().await {
        Ok(status) => {
            debug!(%process, exit_code = ?status.code(), "child exited");
            status.code()
        }
        Err(e) => {
            warn!(%process, error = %e, "waiting for child failed");
            None
        }
    };
    send(&events, process, StreamEvent::Exited(code)).await;
}

/// Returns `false` once the runtime has stopped listening.
async fn send(
    events: &mpsc::Sender<SupervisorEvent>,
    process: ProcessId,
    event: StreamEvent,
) -> bool {
    if events
        .send(SupervisorEvent::Stream { process, event })
        .await
        .is_err()
    {
        debug!(%process, "runtime channel closed; stopping watch");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SlotRegistry;

    fn some_process() -> ProcessId {
        let mut registry = SlotRegistry::new();
        registry.acquire(())
    }

    fn output(chunk: usize, max: usize) -> OutputSection {
        OutputSection {
            read_chunk_size: chunk,
            max_burst_bytes: max,
        }
    }

    async fn collect(mut rx: mpsc::Receiver<SupervisorEvent>) -> Vec<StreamEvent> {
        let mut seen = Vec::new();
        while let Some(SupervisorEvent::Stream { event, .. }) = rx.recv().await {
            seen.push(event);
        }
        seen
    }

    #[tokio::test]
    async fn ready_bytes_are_forwarded_as_one_burst() {
        let data = vec![b'x'; 20_000];
        let (tx, rx) = mpsc::channel(16);
        pump(&data[..], some_process(), StreamKind::Stdout, tx, output(4096, 1 << 20)).await;

        let events = collect(rx).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Data(StreamKind::Stdout, data.clone()),
                StreamEvent::Closed(StreamKind::Stdout),
            ]
        );
    }

    #[tokio::test]
    async fn bursts_are_capped() {
        let data = vec![b'y'; 10];
        let (tx, rx) = mpsc::channel(16);
        pump(&data[..], some_process(), StreamKind::Stderr, tx, output(4, 6)).await;

        let events = collect(rx).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Data(StreamKind::Stderr, vec![b'y'; 6]),
                StreamEvent::Data(StreamKind::Stderr, vec![b'y'; 4]),
                StreamEvent::Closed(StreamKind::Stderr),
            ]
        );
    }

    #[tokio::test]
    async fn empty_stream_only_closes() {
        let (tx, rx) = mpsc::channel(4);
        pump(&b""[..], some_process(), StreamKind::Stdout, tx, output(4096, 4096)).await;
        assert_eq!(collect(rx).await, vec![StreamEvent::Closed(StreamKind::Stdout)]);
    }
}
