use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alphabatch_model::{AcceptResponse, AlphaId, SubmissionCheck};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::SubmissionConfig;
use super::observer::{RunObserver, TracingObserver};
use super::sleep_or_cancel;
use crate::error::Result;
use crate::store::ResultStore;
use crate::transport::SubmissionTransport;

/// Terminal state of one submit-to-production workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Submitted,
    AlreadySubmitted,
    Rejected,
    /// The service never accepted the submission within the attempt budget.
    AcceptExhausted { attempts: u16 },
    Failed { reason: String },
    Cancelled,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Submitted)
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionOutcome::Submitted => f.write_str("submitted"),
            SubmissionOutcome::AlreadySubmitted => f.write_str("already submitted"),
            SubmissionOutcome::Rejected => f.write_str("rejected"),
            SubmissionOutcome::AcceptExhausted { attempts } => {
                write!(f, "not accepted after {attempts} attempts")
            }
            SubmissionOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            SubmissionOutcome::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Takes one evaluated alpha to a terminal submission state.
///
/// Stage one asks the service to accept the submission, retrying a bounded
/// number of times. Stage two polls the submission until the service stops
/// asking for more time.
pub struct SubmissionPoller {
    transport: Arc<dyn SubmissionTransport>,
    config: SubmissionConfig,
    observer: Arc<dyn RunObserver>,
    cancel: CancellationToken,
}

impl fmt::Debug for SubmissionPoller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionPoller")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl SubmissionPoller {
    pub fn new(
        transport: Arc<dyn SubmissionTransport>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            transport,
            config,
            observer: Arc::new(TracingObserver),
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

    pub async fn submit(&self, alpha_id: &AlphaId) -> SubmissionOutcome {
        let outcome = match self.accept(alpha_id).await {
            Ok(()) => self.await_completion(alpha_id).await,
            Err(outcome) => outcome,
        };

        info!(
            target: "alphabatch::submission",
            alpha_id = %alpha_id,
            outcome = %outcome,
            "submission finished"
        );
        self.observer
            .on_progress_text(&format!("alpha {alpha_id}: {outcome}"));
        outcome
    }

    /// Stage one. `Err` carries the terminal outcome when the alpha was not
    /// accepted.
    async fn accept(
        &self,
        alpha_id: &AlphaId,
    ) -> std::result::Result<(), SubmissionOutcome> {
        let max_attempts = self.config.max_accept_attempts.max(1);
        let mut attempts: u16 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(SubmissionOutcome::Cancelled);
            }
            attempts += 1;
            self.observer.on_progress_text(&format!(
                "submitting {alpha_id} (attempt {attempts})"
            ));

            match self.transport.submit_alpha(alpha_id).await {
                Ok(AcceptResponse::Accepted) => {
                    self.observer.on_progress_text(&format!(
                        "alpha {alpha_id} accepted, waiting for completion"
                    ));
                    return Ok(());
                }
                Ok(AcceptResponse::AlreadySubmitted) => {
                    return Err(SubmissionOutcome::AlreadySubmitted);
                }
                Ok(AcceptResponse::Rejected) => {
                    return Err(SubmissionOutcome::Rejected);
                }
                Ok(AcceptResponse::Other(status)) => {
                    warn!(
                        target: "alphabatch::submission",
                        alpha_id = %alpha_id,
                        status,
                        attempts,
                        "submission not accepted"
                    );
                }
                Err(err) => {
                    self.observer.on_error(&format!(
                        "submitting {alpha_id} failed: {err}"
                    ));
                }
            }

            if attempts >= max_attempts {
                return Err(SubmissionOutcome::AcceptExhausted { attempts });
            }
            if !sleep_or_cancel(self.config.accept_retry_interval(), &self.cancel)
                .await
            {
                return Err(SubmissionOutcome::Cancelled);
            }
        }
    }

    /// Stage two.
    async fn await_completion(&self, alpha_id: &AlphaId) -> SubmissionOutcome {
        let heartbeat_every = u64::from(self.config.heartbeat_every.max(1));
        let started = chrono::Utc::now();
        let mut waits: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return SubmissionOutcome::Cancelled;
            }

            match self.transport.check_submission(alpha_id).await {
                Ok(SubmissionCheck::Done) => return SubmissionOutcome::Submitted,
                Ok(SubmissionCheck::Failed { status }) => {
                    return SubmissionOutcome::Failed {
                        reason: format!("status check returned {status}"),
                    };
                }
                Ok(SubmissionCheck::Pending { retry_after_secs }) => {
                    waits += 1;
                    let Ok(wait) = Duration::try_from_secs_f64(retry_after_secs.max(0.0))
                    else {
                        return SubmissionOutcome::Failed {
                            reason: format!("unusable wait hint {retry_after_secs}s"),
                        };
                    };
                    if !sleep_or_cancel(wait, &self.cancel).await {
                        return SubmissionOutcome::Cancelled;
                    }
                    if waits % heartbeat_every == 0 {
                        let elapsed = (chrono::Utc::now() - started)
                            .to_std()
                            .unwrap_or_default();
                        let elapsed = Duration::from_secs(elapsed.as_secs());
                        self.observer.on_progress_text(&format!(
                            "alpha {alpha_id} still processing, {} elapsed",
                            humantime::format_duration(elapsed)
                        ));
                    }
                }
                Err(err) => {
                    return SubmissionOutcome::Failed {
                        reason: err.to_string(),
                    };
                }
            }
        }
    }
}

/// What the workflow did for one alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub alpha_id: AlphaId,
    pub outcome: SubmissionOutcome,
    /// The stored row was flagged as submitted.
    pub recorded: bool,
}

/// Runs submissions against the result store and records successes.
#[derive(Debug)]
pub struct SubmissionWorkflow {
    poller: SubmissionPoller,
    store: ResultStore,
}

impl SubmissionWorkflow {
    pub fn new(poller: SubmissionPoller, store: ResultStore) -> Self {
        Self { poller, store }
    }

    /// Submits one alpha and marks its record on success.
    ///
    /// A store failure after a successful submission is reported through
    /// the observer and leaves `recorded` false; the outcome is kept.
    pub async fn submit_one(&self, alpha_id: &AlphaId) -> SubmissionReport {
        let outcome = self.poller.submit(alpha_id).await;
        let mut recorded = false;

        if outcome.is_success() {
            match self.store.mark_submitted(alpha_id).await {
                Ok(true) => recorded = true,
                Ok(false) => warn!(
                    target: "alphabatch::submission",
                    alpha_id = %alpha_id,
                    "submitted alpha has no stored record"
                ),
                Err(err) => {
                    warn!(
                        target: "alphabatch::submission",
                        alpha_id = %alpha_id,
                        error = %err,
                        "could not mark alpha as submitted"
                    );
                    self.poller.observer.on_error(&format!(
                        "alpha {alpha_id} was submitted but marking it failed: {err}"
                    ));
                }
            }
        }

        SubmissionReport {
            alpha_id: alpha_id.clone(),
            outcome,
            recorded,
        }
    }

    /// Submits every unsubmitted record in store order, one at a time.
    ///
    /// Only reading the pending list can fail; per-alpha problems end up in
    /// the reports.
    pub async fn submit_all(&self) -> Result<Vec<SubmissionReport>> {
        let pending = self.store.unsubmitted().await?;
        let total = pending.len();
        let mut reports = Vec::with_capacity(total);

        for (index, record) in pending.into_iter().enumerate() {
            if self.poller.cancel.is_cancelled() {
                break;
            }
            reports.push(self.submit_one(&record.alpha_id).await);
            self.poller.observer.on_overall_progress(
                (((index + 1) * 100) / total.max(1)) as u8,
                index + 1,
                total,
            );
        }
        Ok(reports)
    }
}
