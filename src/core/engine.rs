use crate::core::adapter::TranscodeAdapter;
use crate::core::error::ValidationError;
use crate::core::events::{EngineEvent, JobSink};
use crate::core::model::*;
use crate::core::paths::validate_request;
use crate::core::runner::BatchRunner;
use crate::plugins::registry::{BackendContext, TranscodeBackend};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, Notify};
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// How a job ended. `batch` is set when the batch path ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCompletion {
    pub success: bool,
    pub message: String,
    pub batch: Option<BatchResult>,
}

#[derive(Debug, Clone)]
struct JobState {
    status: JobStatus,
    completion: Option<JobCompletion>,
}

/// Starts jobs on background tasks and publishes their events.
#[derive(Clone)]
pub struct Engine {
    adapter: Arc<TranscodeAdapter>,
    event_tx: broadcast::Sender<EngineEvent>,
    jobs: Arc<Mutex<HashMap<JobId, JobState>>>,
    job_notifies: Arc<Mutex<HashMap<JobId, Arc<Notify>>>>,
}

impl Engine {
    pub fn new(backend: Arc<dyn TranscodeBackend>, backend_ctx: BackendContext) -> Self {
        Self::with_capacity(backend, backend_ctx, DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_capacity(backend: Arc<dyn TranscodeBackend>, backend_ctx: BackendContext, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(16));
        Self {
            adapter: Arc::new(TranscodeAdapter::new(backend, backend_ctx)),
            event_tx,
            jobs: Arc::new(Mutex::new(HashMap::new())),
            job_notifies: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Validates the request and the settings profile, then starts the job on
    /// its own task. Nothing is published for a request that fails validation.
    pub async fn start(
        &self,
        inputs: Vec<PathBuf>,
        out_dir: PathBuf,
        settings: ConversionSettings,
        batch_mode: bool,
    ) -> Result<JobId, ValidationError> {
        validate_request(&inputs, &out_dir).await?;
        settings.validate()?;

        let job_id = Uuid::new_v4();
        {
            let mut jobs = self.jobs.lock().await;
            jobs.insert(job_id, JobState { status: JobStatus::Pending, completion: None });
        }
        let notify = Arc::new(Notify::new());
        {
            let mut m = self.job_notifies.lock().await;
            m.insert(job_id, notify.clone());
        }
        self.publish(EngineEvent::JobStatusChanged { job_id, status: JobStatus::Pending });

        info!(%job_id, items = inputs.len(), batch_mode, "job accepted");

        let engine = self.clone();
        let settings = Arc::new(settings);
        tokio::spawn(async move {
            engine.run_job(job_id, inputs, out_dir, settings, batch_mode, notify).await;
        });

        Ok(job_id)
    }

    /// Resolves once the job has completed. Returns `None` for unknown ids.
    pub async fn wait_job(&self, job_id: JobId) -> Option<JobCompletion> {
        let notify = {
            let m = self.job_notifies.lock().await;
            m.get(&job_id).cloned()
        };

        if let Some(n) = notify {
            let notified = n.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.is_job_finished(job_id).await {
                notified.await;
            }
        }

        let jobs = self.jobs.lock().await;
        jobs.get(&job_id).and_then(|s| s.completion.clone())
    }

    /// Like [`Engine::wait_job`], but the job is forgotten once its completion
    /// is handed over. Finished jobs are otherwise kept for the engine's lifetime.
    pub async fn take_completion(&self, job_id: JobId) -> Option<JobCompletion> {
        let completion = self.wait_job(job_id).await?;
        self.jobs.lock().await.remove(&job_id);
        Some(completion)
    }

    pub async fn job_status(&self, job_id: JobId) -> Option<JobStatus> {
        let jobs = self.jobs.lock().await;
        jobs.get(&job_id).map(|s| s.status)
    }

    pub async fn is_job_finished(&self, job_id: JobId) -> bool {
        matches!(self.job_status(job_id).await, Some(JobStatus::Completed | JobStatus::Failed))
    }

    fn publish(&self, event: EngineEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::trace!("no subscribers for engine event");
        }
    }

    async fn set_status(&self, job_id: JobId, status: JobStatus) {
        {
            let mut jobs = self.jobs.lock().await;
            if let Some(s) = jobs.get_mut(&job_id) {
                s.status = status;
            }
        }
        self.publish(EngineEvent::JobStatusChanged { job_id, status });
    }

    async fn run_job(
        &self,
        job_id: JobId,
        inputs: Vec<PathBuf>,
        out_dir: PathBuf,
        settings: Arc<ConversionSettings>,
        batch_mode: bool,
        notify: Arc<Notify>,
    ) {
        self.set_status(job_id, JobStatus::Running).await;

        let sink = JobSink::new(job_id, self.event_tx.clone());
        let runner = BatchRunner::new(self.adapter.clone());

        let completion = match inputs.as_slice() {
            [first, rest @ ..] if !batch_mode || rest.is_empty() => {
                let outcome = runner.run_single(first, &out_dir, &settings, &sink).await;
                JobCompletion { success: outcome.success, message: outcome.message, batch: None }
            }
            _ => {
                let result = runner.run_batch(&inputs, &out_dir, &settings, &sink).await;
                let message = if result.is_success() {
                    format!("All {} videos converted successfully!", result.succeeded_count)
                } else {
                    format!("Batch conversion completed with {} failures", result.failed_count())
                };
                JobCompletion { success: result.is_success(), message, batch: Some(result) }
            }
        };

        let status = if completion.success { JobStatus::Completed } else { JobStatus::Failed };
        info!(%job_id, ?status, message = %completion.message, "job finished");

        {
            let mut jobs = self.jobs.lock().await;
            if let Some(s) = jobs.get_mut(&job_id) {
                s.completion = Some(completion.clone());
            }
        }
        self.set_status(job_id, status).await;
        self.publish(EngineEvent::Completed { job_id, success: completion.success, message: completion.message });

        {
            let mut m = self.job_notifies.lock().await;
            m.remove(&job_id);
        }
        notify.notify_waiters();
    }
}
