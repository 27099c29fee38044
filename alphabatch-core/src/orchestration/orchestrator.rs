use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use alphabatch_model::{
    AlphaId, Job, JobId, JobStatus, PollLocator, PollSnapshot,
    SimulationRequest, SimulationSettings,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::OrchestratorConfig;
use super::observer::{JobReport, RunObserver, TracingObserver};
use super::sleep_or_cancel;
use crate::error::Result;
use crate::expression::{is_vector_identifier, substitute};
use crate::progress::ProgressAggregator;
use crate::store::ResultStore;
use crate::transport::{SimulationTransport, SubmitOutcome, TransportError};
use crate::validation::{GateVerdict, evaluate};

/// Everything a run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Expression template with a single placeholder.
    pub template: String,
    pub settings: SimulationSettings,
    /// Identifiers to substitute, in submission order.
    pub identifiers: Vec<String>,
}

/// Per-status tally of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub complete: usize,
    pub error: usize,
    pub skipped: usize,
    pub submit_failed: usize,
    pub lost: usize,
    pub cancelled: usize,
    /// Completed jobs whose record passed the gate and was stored.
    pub persisted: usize,
    /// Completed jobs dropped by the gate.
    pub discarded: usize,
    pub was_cancelled: bool,
}

impl RunSummary {
    fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Complete => self.complete += 1,
            JobStatus::Error => self.error += 1,
            JobStatus::Skipped => self.skipped += 1,
            JobStatus::SubmitFailed => self.submit_failed += 1,
            JobStatus::Lost => self.lost += 1,
            JobStatus::Cancelled => self.cancelled += 1,
            JobStatus::Pending | JobStatus::Submitting | JobStatus::Active => {}
        }
    }

    pub fn retired(&self) -> usize {
        self.complete
            + self.error
            + self.skipped
            + self.submit_failed
            + self.lost
            + self.cancelled
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} jobs: {} complete ({} persisted, {} discarded), {} error, {} skipped, \
             {} submit failed, {} lost, {} cancelled",
            self.total,
            self.complete,
            self.persisted,
            self.discarded,
            self.error,
            self.skipped,
            self.submit_failed,
            self.lost,
            self.cancelled
        )
    }
}

#[derive(Debug)]
struct ActiveJob {
    job: Job,
    locator: PollLocator,
}

/// Bounded-concurrency scheduler for one batch of simulations.
///
/// One control loop submits, polls and retires jobs in cycles. The number
/// of ACTIVE jobs never exceeds the configured concurrency, and new
/// submissions also back off while the service reports the account's
/// quota as used up.
pub struct SimulationOrchestrator {
    transport: Arc<dyn SimulationTransport>,
    store: ResultStore,
    observer: Arc<dyn RunObserver>,
    config: OrchestratorConfig,
    template: String,
    settings: SimulationSettings,
    identifiers: VecDeque<String>,
    /// Rate-limited job waiting at the front of the queue.
    deferred: Option<Job>,
    active: BTreeMap<JobId, ActiveJob>,
    progress: ProgressAggregator,
    next_id: JobId,
    summary: RunSummary,
    cancel: CancellationToken,
}

impl fmt::Debug for SimulationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationOrchestrator")
            .field("config", &self.config)
            .field("template", &self.template)
            .field("pending", &self.identifiers.len())
            .field("deferred", &self.deferred.as_ref().map(|job| job.id))
            .field("active", &self.active.len())
            .field("summary", &self.summary)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl SimulationOrchestrator {
    pub fn new(
        transport: Arc<dyn SimulationTransport>,
        store: ResultStore,
        config: OrchestratorConfig,
        plan: RunPlan,
    ) -> Self {
        let total = plan.identifiers.len();
        Self {
            transport,
            store,
            observer: Arc::new(TracingObserver),
            config,
            template: plan.template,
            settings: plan.settings,
            identifiers: plan.identifiers.into(),
            deferred: None,
            active: BTreeMap::new(),
            progress: ProgressAggregator::new(total),
            next_id: JobId::default(),
            summary: RunSummary {
                total,
                ..RunSummary::default()
            },
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn has_pending(&self) -> bool {
        self.deferred.is_some() || !self.identifiers.is_empty()
    }

    fn is_finished(&self) -> bool {
        !self.has_pending() && self.active.is_empty()
    }

    /// Drives the run to completion or cancellation.
    ///
    /// Job-level failures are reported through the observer and counted in
    /// the summary; only a broken job lifecycle surfaces as an error.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(
            target: "alphabatch::orchestrator",
            total = self.summary.total,
            max_concurrency = self.config.max_concurrency.get(),
            "starting batch run"
        );

        while !self.cancel.is_cancelled() && !self.is_finished() {
            let external = match self.transport.running_simulations().await {
                Ok(count) => count,
                Err(err) => {
                    self.observer.on_error(&format!(
                        "could not read running simulations: {err}"
                    ));
                    0
                }
            };

            let limit = self.config.max_concurrency.get();
            let busy = external.max(self.active.len());
            if busy >= limit {
                if self.active.is_empty() {
                    self.observer.on_progress_text(&format!(
                        "service reports {external} running simulations, waiting {}s",
                        self.config.saturation_backoff().as_secs()
                    ));
                    if !sleep_or_cancel(
                        self.config.saturation_backoff(),
                        &self.cancel,
                    )
                    .await
                    {
                        break;
                    }
                    continue;
                }
                debug!(
                    target: "alphabatch::orchestrator",
                    external,
                    local = self.active.len(),
                    "no free slots this cycle"
                );
            } else {
                self.submit_cycle(limit - busy).await?;
            }

            self.poll_cycle().await?;
            self.emit_progress();

            if self.is_finished() {
                break;
            }
            if !sleep_or_cancel(self.config.cycle_interval(), &self.cancel).await
            {
                break;
            }
        }

        if self.cancel.is_cancelled() {
            self.abandon()?;
        }

        info!(
            target: "alphabatch::orchestrator",
            summary = %self.summary,
            "batch run finished"
        );
        Ok(self.summary)
    }

    fn next_job(&mut self) -> Option<Job> {
        if let Some(job) = self.deferred.take() {
            return Some(job);
        }
        let field = self.identifiers.pop_front()?;
        let job = Job::pending(self.next_id, field);
        self.next_id = self.next_id.next();
        Some(job)
    }

    async fn submit_cycle(&mut self, slots: usize) -> Result<()> {
        for _ in 0..slots {
            if self.cancel.is_cancelled() {
                break;
            }
            let Some(mut job) = self.next_job() else {
                break;
            };
            job.transition(JobStatus::Submitting)?;

            if is_vector_identifier(&job.source_field) {
                self.observer
                    .on_progress_text(&format!("skipping vector field {}", job.source_field));
                job.transition(JobStatus::Skipped)?;
                self.retire(job, None, false, None);
                continue;
            }

            let expression = match substitute(&self.template, &job.source_field) {
                Ok(expression) => expression,
                Err(err) => {
                    self.observer.on_error(&err.to_string());
                    job.transition(JobStatus::SubmitFailed)?;
                    self.retire(job, None, false, Some(err.to_string()));
                    continue;
                }
            };
            job.expression = expression;

            let request =
                SimulationRequest::regular(self.settings.clone(), job.expression.clone());
            match self.transport.submit_simulation(&request).await {
                Ok(SubmitOutcome::Accepted(locator)) => {
                    job.transition(JobStatus::Active)?;
                    self.observer.on_progress_text(&format!(
                        "job {} submitted: {}",
                        job.id, job.expression
                    ));
                    self.progress.track(job.id);
                    self.active.insert(job.id, ActiveJob { job, locator });
                }
                Ok(SubmitOutcome::RateLimited) => {
                    warn!(
                        target: "alphabatch::orchestrator",
                        job_id = %job.id,
                        "rate limited, deferring to next cycle"
                    );
                    self.observer.on_progress_text(&format!(
                        "rate limited while submitting job {}, retrying next cycle",
                        job.id
                    ));
                    job.transition(JobStatus::Pending)?;
                    self.deferred = Some(job);
                    break;
                }
                Ok(SubmitOutcome::Rejected { status, body }) => {
                    let message = format!("submission rejected with status {status}: {body}");
                    self.observer.on_error(&format!("job {}: {message}", job.id));
                    job.transition(JobStatus::SubmitFailed)?;
                    self.retire(job, None, false, Some(message));
                }
                Err(err) => {
                    self.observer
                        .on_error(&format!("job {} submission failed: {err}", job.id));
                    job.transition(JobStatus::SubmitFailed)?;
                    self.retire(job, None, false, Some(err.to_string()));
                }
            }
        }
        Ok(())
    }

    async fn poll_cycle(&mut self) -> Result<()> {
        let ids: Vec<JobId> = self.active.keys().copied().collect();
        for id in ids {
            let Some(locator) = self.active.get(&id).map(|a| a.locator.clone())
            else {
                continue;
            };

            match self.transport.poll_simulation(&locator).await {
                Ok(snapshot) => self.observe(id, snapshot).await?,
                Err(TransportError::NotFound(_)) => {
                    self.finish_active(
                        id,
                        JobStatus::Lost,
                        None,
                        false,
                        Some("simulation no longer exists".to_string()),
                    )?;
                }
                Err(err) => {
                    self.observer
                        .on_error(&format!("job {id} poll failed: {err}"));
                    self.finish_active(
                        id,
                        JobStatus::Error,
                        None,
                        false,
                        Some(err.to_string()),
                    )?;
                }
            }
        }
        Ok(())
    }

    async fn observe(&mut self, id: JobId, snapshot: PollSnapshot) -> Result<()> {
        if let Some(fraction) = snapshot.fraction() {
            let status = snapshot
                .body
                .status
                .clone()
                .unwrap_or_else(|| "running".to_string());
            self.progress.update(id, fraction, status);
        }

        if snapshot.is_error() {
            let message = snapshot.message().to_string();
            self.observer
                .on_error(&format!("job {id} failed: {message}"));
            return self.finish_active(id, JobStatus::Error, None, false, Some(message));
        }

        if !snapshot.is_complete() {
            return Ok(());
        }

        let Some(alpha_id) = snapshot
            .body
            .result_id
            .clone()
            .filter(|alpha_id| !alpha_id.is_empty())
        else {
            let message = "completed without a result id".to_string();
            self.observer.on_error(&format!("job {id}: {message}"));
            return self.finish_active(id, JobStatus::Error, None, false, Some(message));
        };

        let result = match self.transport.fetch_alpha(&alpha_id).await {
            Ok(result) => result,
            Err(err) => {
                self.observer.on_error(&format!(
                    "job {id}: could not fetch result {alpha_id}: {err}"
                ));
                return self.finish_active(
                    id,
                    JobStatus::Error,
                    Some(alpha_id),
                    false,
                    Some(err.to_string()),
                );
            }
        };

        let (persisted, message) = match evaluate(&result) {
            GateVerdict::Accepted(record) => match self.store.persist(record).await {
                Ok(()) => {
                    self.summary.persisted += 1;
                    (true, None)
                }
                Err(err) => {
                    self.observer.on_error(&format!(
                        "job {id}: storing result {alpha_id} failed: {err}"
                    ));
                    (false, Some(err.to_string()))
                }
            },
            GateVerdict::Rejected { failing, .. } => {
                let message = format!("discarded, failing checks: {}", failing.join(", "));
                info!(
                    target: "alphabatch::orchestrator",
                    job_id = %id,
                    alpha_id = %alpha_id,
                    "{message}"
                );
                self.summary.discarded += 1;
                (false, Some(message))
            }
        };

        self.finish_active(id, JobStatus::Complete, Some(alpha_id), persisted, message)
    }

    fn finish_active(
        &mut self,
        id: JobId,
        status: JobStatus,
        alpha_id: Option<AlphaId>,
        persisted: bool,
        message: Option<String>,
    ) -> Result<()> {
        if let Some(ActiveJob { mut job, .. }) = self.active.remove(&id) {
            job.transition(status)?;
            self.retire(job, alpha_id, persisted, message);
        }
        Ok(())
    }

    fn retire(
        &mut self,
        job: Job,
        alpha_id: Option<AlphaId>,
        persisted: bool,
        message: Option<String>,
    ) {
        self.progress.retire(job.id);
        self.summary.record(job.status);
        let report = JobReport {
            job_id: job.id,
            source_field: job.source_field,
            expression: job.expression,
            status: job.status,
            alpha_id,
            persisted,
            message,
        };
        self.observer.on_job_complete(&report);
    }

    fn emit_progress(&self) {
        let retired = self.progress.retired();
        let total = self.progress.total();
        self.observer
            .on_overall_progress(self.progress.overall_percent(), retired, total);
        self.observer
            .on_progress_text(&format!("{retired}/{total}"));
    }

    /// Retires everything still pending or in flight as CANCELLED.
    fn abandon(&mut self) -> Result<()> {
        self.summary.was_cancelled = true;

        let active: Vec<JobId> = self.active.keys().copied().collect();
        for id in active {
            self.finish_active(id, JobStatus::Cancelled, None, false, None)?;
        }

        while let Some(mut job) = self.next_job() {
            job.transition(JobStatus::Cancelled)?;
            self.retire(job, None, false, None);
        }

        warn!(
            target: "alphabatch::orchestrator",
            cancelled = self.summary.cancelled,
            "run cancelled"
        );
        Ok(())
    }
}
