//! Background download worker
//!
//! Runs a download as a child process, feeds it the URL on stdin and relays
//! its merged stdout/stderr as an ordered stream of [`WorkerEvent`]s ending in
//! exactly one terminal event. Only one worker per [`WorkerSlot`] may run.

use crate::error::{HoardError, Result};
use crate::types::{MediaKind, WorkerEvent, WorkerRequest};
use std::io::{BufRead, BufReader, PipeReader};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const EVENT_BUFFER: usize = 256;

/// Admits at most one running worker
#[derive(Debug, Default, Clone)]
pub struct WorkerSlot {
    active: Arc<AtomicBool>,
}

/// Clears the slot when the worker is done, even on panic
struct ActiveGuard(Arc<AtomicBool>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl WorkerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a worker, or fail with `WorkerBusy` if one is still running.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: WorkerRequest) -> Result<WorkerHandle> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(HoardError::WorkerBusy);
        }

        let guard = ActiveGuard(self.active.clone());
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let task = tokio::spawn(async move {
            let terminal = run(&request, &tx).await;
            // free the slot before anyone can observe the terminal event
            drop(guard);
            let _ = tx.send(terminal).await;
        });

        Ok(WorkerHandle { events: rx, task })
    }
}

/// Receiving end of a running worker
#[derive(Debug)]
pub struct WorkerHandle {
    events: mpsc::Receiver<WorkerEvent>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Next event; `None` once the stream has ended
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        self.events.recv().await
    }

    /// Drain the stream, passing each event to `on_event`, and return the
    /// terminal event.
    pub async fn run_to_end<F: FnMut(&WorkerEvent)>(mut self, mut on_event: F) -> WorkerEvent {
        let mut terminal = None;
        while let Some(event) = self.events.recv().await {
            on_event(&event);
            if event.is_terminal() {
                terminal = Some(event);
                break;
            }
        }

        if let Err(e) = self.task.await {
            tracing::error!("worker task failed: {}", e);
        }

        terminal.unwrap_or_else(|| WorkerEvent::Error("worker stopped without a result".into()))
    }
}

fn success_message(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Audio => "Audio download completed successfully!",
        MediaKind::Video => "Video download completed successfully!",
    }
}

async fn emit(tx: &mpsc::Sender<WorkerEvent>, line: impl Into<String>) {
    let _ = tx.send(WorkerEvent::Output(line.into())).await;
}

/// Forward every line written to the shared output pipe as an output event.
/// Both child streams write into the same pipe, so lines arrive in the order
/// the child produced them.
fn relay_lines(reader: PipeReader, tx: mpsc::Sender<WorkerEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim_end().to_string();
                    if tx.blocking_send(WorkerEvent::Output(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!("stopped reading child output: {}", e);
                    break;
                }
            }
        }
    })
}

/// Everything up to, but not including, delivery of the terminal event
async fn run(request: &WorkerRequest, tx: &mpsc::Sender<WorkerEvent>) -> WorkerEvent {
    emit(tx, format!("Starting {} download...", request.kind)).await;
    emit(tx, format!("URL: {}", request.url)).await;
    emit(tx, "-".repeat(50)).await;

    let (reader, writer) = match std::io::pipe() {
        Ok(pair) => pair,
        Err(e) => return WorkerEvent::Error(format!("Failed to create output pipe: {}", e)),
    };
    let writer_for_stderr = match writer.try_clone() {
        Ok(w) => w,
        Err(e) => return WorkerEvent::Error(format!("Failed to create output pipe: {}", e)),
    };

    let mut command = Command::new(&request.program);
    command
        .args(&request.args)
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(writer)
        .stderr(writer_for_stderr)
        .kill_on_drop(true);

    let spawned = command.spawn();
    // the command holds the write ends; EOF only arrives once they are closed
    drop(command);

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            return WorkerEvent::Error(format!(
                "Failed to start {}: {}",
                request.program.display(),
                e
            ));
        }
    };

    let Some(mut stdin) = child.stdin.take() else {
        let _ = child.kill().await;
        return WorkerEvent::Error("Failed to open stdin for the child process".into());
    };
    if let Err(e) = stdin.write_all(format!("{}\n", request.url).as_bytes()).await {
        tracing::warn!("could not write URL to child: {}", e);
    }
    drop(stdin);

    let relay = relay_lines(reader, tx.clone());
    let status = child.wait().await;
    if let Err(e) = relay.await {
        tracing::error!("output relay failed: {}", e);
    }

    match status {
        Ok(status) if status.success() => WorkerEvent::Finished {
            success: true,
            message: success_message(request.kind).into(),
        },
        Ok(status) => WorkerEvent::Finished {
            success: false,
            message: match status.code() {
                Some(code) => format!("Download failed with return code: {}", code),
                None => "Download was terminated by a signal".into(),
            },
        },
        Err(e) => WorkerEvent::Error(format!("Failed to wait for child process: {}", e)),
    }
}
