use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::error::Result;
use crate::model::{LoadedProject, OpId, OpResult, PendingKind};

use super::backend::SchedulerBackend;

enum Command {
    Load { project_id: u64 },
    Execute { project_id: u64, op: OpId, kind: PendingKind },
}

#[derive(Debug)]
pub enum WorkerEvent {
    Loaded(Result<LoadedProject>),
    Finished { op: OpId, result: OpResult },
}

/// Runs backend calls on a background thread.
///
/// Commands are handled one at a time in submission order. Results are
/// picked up by `drain` on the UI thread.
///
/// Dropping the worker never waits: the thread is detached, finishes the call
/// it is in, finds nobody listening and exits. Queued calls are not run.
pub struct Worker {
    commands: Sender<Command>,
    events: Receiver<WorkerEvent>,
    label: String,
}

impl Worker {
    /// `notify` is called after every event, e.g. to request a repaint.
    pub fn spawn<F>(mut backend: Box<dyn SchedulerBackend>, notify: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let label = backend.describe();
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>();

        std::thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let event = match command {
                    Command::Load { project_id } => {
                        let loaded = backend.load(project_id);
                        if let Err(err) = &loaded {
                            tracing::warn!(project = project_id, %err, "load failed");
                        }
                        WorkerEvent::Loaded(loaded)
                    }
                    Command::Execute { project_id, op, kind } => {
                        let result = backend.execute(project_id, &kind);
                        tracing::debug!(op = %op, what = %kind.describe(), ?result, "backend call finished");
                        WorkerEvent::Finished { op, result }
                    }
                };
                if event_tx.send(event).is_err() {
                    tracing::debug!("worker detached, remaining calls dropped");
                    break;
                }
                notify();
            }
        });

        Self {
            commands: cmd_tx,
            events: event_rx,
            label,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn load(&self, project_id: u64) {
        self.send(Command::Load { project_id });
    }

    pub fn execute(&self, project_id: u64, op: OpId, kind: PendingKind) {
        self.send(Command::Execute { project_id, op, kind });
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!(backend = %self.label, "worker thread is gone, command dropped");
        }
    }

    /// Everything that finished since the last call. Never blocks.
    pub fn drain(&self) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Block for the next event. Used by tests and headless callers.
    pub fn wait(&self, timeout: Duration) -> Option<WorkerEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}
