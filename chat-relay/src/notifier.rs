//! Outbound notifications to the downstream service.
//!
//! [`Notifier::dispatch`] never blocks the event path: [`HttpNotifier`] spawns one task per job,
//! makes a single attempt with a request timeout, and logs failures. Nothing is retried and
//! nothing flows back into the pipeline.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use relay_core::{RelayError, Result};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::EndpointConfig;
use crate::console;

/// Body of a context-forward request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextForward {
    pub sender: String,
    pub message: String,
    pub history: Vec<String>,
}

/// Body of an invoice-submit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceSubmit {
    pub chats: Vec<String>,
    pub customer_name: String,
    pub customer_phone: String,
}

/// A unit of outbound work. Payloads are owned copies, never shared with the history cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundJob {
    ContextForward(ContextForward),
    InvoiceSubmit(InvoiceSubmit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    ContextForward,
    InvoiceSubmit,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContextForward => "context_forward",
            Self::InvoiceSubmit => "invoice_submit",
        }
    }

    /// Context forwarding accepts any 2xx; invoice submission only 200.
    pub fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::ContextForward => status.is_success(),
            Self::InvoiceSubmit => status == StatusCode::OK,
        }
    }
}

impl OutboundJob {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::ContextForward(_) => JobKind::ContextForward,
            Self::InvoiceSubmit(_) => JobKind::InvoiceSubmit,
        }
    }
}

/// Fire-and-forget delivery of outbound jobs.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hands the job off; returns immediately.
    fn dispatch(&self, job: OutboundJob);

    /// Waits up to `grace` for in-flight jobs, abandoning the rest. Returns how many were abandoned.
    async fn drain(&self, _grace: Duration) -> usize {
        0
    }
}

struct Endpoints {
    client: reqwest::Client,
    context_forward: Url,
    invoice_submit: Url,
}

impl Endpoints {
    /// One attempt. `Err` carries the status and response body, or the transport error.
    async fn deliver(&self, job: &OutboundJob) -> Result<StatusCode> {
        let request = match job {
            OutboundJob::ContextForward(body) => {
                self.client.post(self.context_forward.clone()).json(body)
            }
            OutboundJob::InvoiceSubmit(body) => {
                self.client.post(self.invoice_submit.clone()).json(body)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::Notify(format!("request failed: {}", e)))?;
        let status = response.status();
        if job.kind().accepts(status) {
            return Ok(status);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RelayError::Notify(format!(
            "status {}: {}",
            status.as_u16(),
            body
        )))
    }
}

/// Sends jobs over HTTP, at most `max_in_flight` at a time.
pub struct HttpNotifier {
    endpoints: Arc<Endpoints>,
    permits: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
}

impl HttpNotifier {
    pub fn new(config: &EndpointConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self {
            endpoints: Arc::new(Endpoints {
                client,
                context_forward: config.context_forward_url()?,
                invoice_submit: config.invoice_submit_url()?,
            }),
            permits: Arc::new(Semaphore::new(config.max_in_flight)),
            tasks: Mutex::new(JoinSet::new()),
        })
    }

    /// Sends one job and waits for the outcome. Used by `dispatch` tasks.
    #[instrument(skip(self, job), fields(kind = job.kind().as_str()))]
    pub async fn deliver(&self, job: &OutboundJob) -> Result<StatusCode> {
        self.endpoints.deliver(job).await
    }

    /// Jobs spawned and not yet reaped.
    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn dispatch(&self, job: OutboundJob) {
        let job_id = Uuid::new_v4();
        let endpoints = self.endpoints.clone();
        let permits = self.permits.clone();

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                if e.is_panic() {
                    error!(error = %e, "Dispatch task panicked");
                }
            }
        }

        info!(job_id = %job_id, kind = job.kind().as_str(), "step: dispatching outbound job");
        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let outcome = endpoints.deliver(&job).await;
            report(job_id, &job, outcome);
        });
    }

    async fn drain(&self, grace: Duration) -> usize {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *guard)
        };
        if tasks.is_empty() {
            return 0;
        }
        info!(pending = tasks.len(), "Waiting for in-flight dispatches");

        let drained = tokio::time::timeout(grace, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        match drained {
            Ok(()) => 0,
            Err(_) => {
                let abandoned = tasks.len();
                tasks.abort_all();
                warn!(abandoned, "Abandoned in-flight dispatches at shutdown");
                abandoned
            }
        }
    }
}

/// Logs the outcome; invoice outcomes are also shown on the console.
fn report(job_id: Uuid, job: &OutboundJob, outcome: Result<StatusCode>) {
    match (job, outcome) {
        (OutboundJob::ContextForward(body), Ok(status)) => {
            info!(job_id = %job_id, sender = %body.sender, status = status.as_u16(), "Context forwarded");
        }
        (OutboundJob::ContextForward(body), Err(e)) => {
            warn!(job_id = %job_id, sender = %body.sender, error = %e, "Context forward failed, dropped");
        }
        (OutboundJob::InvoiceSubmit(body), Ok(status)) => {
            info!(
                job_id = %job_id,
                customer_phone = %body.customer_phone,
                chats = body.chats.len(),
                status = status.as_u16(),
                "Invoice request accepted"
            );
            console::notice(&format!(
                "[System] Invoice request sent for {}. Frontend will be notified.",
                body.customer_name
            ));
        }
        (OutboundJob::InvoiceSubmit(body), Err(e)) => {
            error!(
                job_id = %job_id,
                customer_phone = %body.customer_phone,
                error = %e,
                "Invoice request failed, dropped"
            );
            console::notice(&format!("[Error] Invoice request failed: {}", e));
        }
    }
}

/// Jobs kept by [`DryRunNotifier::new`].
pub const DEFAULT_RETAINED_JOBS: usize = 1024;

/// Logs jobs instead of sending them, keeping only the most recent `capacity` of them.
///
/// `--dry-run` uses capacity 0 (log only); tests use a recording capacity to assert on jobs.
#[derive(Debug)]
pub struct DryRunNotifier {
    capacity: usize,
    jobs: Mutex<VecDeque<OutboundJob>>,
}

impl Default for DryRunNotifier {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_RETAINED_JOBS)
    }
}

impl DryRunNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains at most `capacity` jobs; older ones are dropped first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    /// Log-only notifier that retains nothing.
    pub fn logging_only() -> Self {
        Self::with_capacity(0)
    }

    /// Retained jobs, oldest first.
    pub fn jobs(&self) -> Vec<OutboundJob> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn jobs_of(&self, kind: JobKind) -> Vec<OutboundJob> {
        self.jobs()
            .into_iter()
            .filter(|job| job.kind() == kind)
            .collect()
    }
}

#[async_trait]
impl Notifier for DryRunNotifier {
    fn dispatch(&self, job: OutboundJob) {
        match &job {
            OutboundJob::ContextForward(body) => info!(
                sender = %body.sender,
                history_len = body.history.len(),
                "dry-run: context forward"
            ),
            OutboundJob::InvoiceSubmit(body) => info!(
                customer_phone = %body.customer_phone,
                chats = body.chats.len(),
                "dry-run: invoice submit"
            ),
        }
        if self.capacity == 0 {
            return;
        }
        let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        if jobs.len() == self.capacity {
            jobs.pop_front();
        }
        jobs.push_back(job);
    }
}
