use crate::core::model::{ItemStatus, JobId, JobStatus};
use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressScope {
    Item,
    Overall,
}

/// What the runner and adapter report while a job is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Log(String),
    Percent { scope: ProgressScope, value: u8 },
    ItemStatus { index: usize, input: PathBuf, status: ItemStatus },
}

/// What the engine publishes to subscribers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    JobStatusChanged { job_id: JobId, status: JobStatus },
    Job { job_id: JobId, event: ProgressEvent },
    Completed { job_id: JobId, success: bool, message: String },
}

impl EngineEvent {
    pub fn job_id(&self) -> JobId {
        match self {
            EngineEvent::JobStatusChanged { job_id, .. }
            | EngineEvent::Job { job_id, .. }
            | EngineEvent::Completed { job_id, .. } => *job_id,
        }
    }
}

/// Observer for progress events. Implementations must deliver events in the
/// order `emit` is called.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    fn log(&self, message: String) {
        self.emit(ProgressEvent::Log(message));
    }

    fn percent(&self, scope: ProgressScope, value: u8) {
        self.emit(ProgressEvent::Percent { scope, value });
    }
}

/// Tags every event with its job and forwards it to the engine's broadcast channel.
pub struct JobSink {
    job_id: JobId,
    tx: broadcast::Sender<EngineEvent>,
}

impl JobSink {
    pub fn new(job_id: JobId, tx: broadcast::Sender<EngineEvent>) -> Self {
        Self { job_id, tx }
    }
}

impl EventSink for JobSink {
    fn emit(&self, event: ProgressEvent) {
        if self.tx.send(EngineEvent::Job { job_id: self.job_id, event }).is_err() {
            tracing::trace!(job_id = %self.job_id, "no subscribers for job event");
        }
    }
}

/// Keeps every event in memory.
#[cfg(test)]
#[derive(Default)]
pub struct CollectingSink {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn logs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Log(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn percents(&self, scope: ProgressScope) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Percent { scope: s, value } if s == scope => Some(value),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl EventSink for CollectingSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
