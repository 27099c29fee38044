use alphabatch_model::{AlphaId, JobId, JobStatus};
use tracing::{error, info};

/// What happened to one job when it left the run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub job_id: JobId,
    pub source_field: String,
    pub expression: String,
    pub status: JobStatus,
    pub alpha_id: Option<AlphaId>,
    /// Whether a gate-passing record was written to the store.
    pub persisted: bool,
    pub message: Option<String>,
}

/// Sink for everything a run or submission workflow reports.
///
/// Callbacks run synchronously on the control loop and must not block.
pub trait RunObserver: Send + Sync {
    fn on_progress_text(&self, _text: &str) {}

    fn on_overall_progress(&self, _percent: u8, _retired: usize, _total: usize) {}

    fn on_job_complete(&self, _report: &JobReport) {}

    fn on_error(&self, _message: &str) {}
}

/// Observer that forwards every callback to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_progress_text(&self, text: &str) {
        info!(target: "alphabatch::orchestrator", "{text}");
    }

    fn on_overall_progress(&self, percent: u8, retired: usize, total: usize) {
        info!(
            target: "alphabatch::orchestrator",
            percent,
            "progress {retired}/{total}"
        );
    }

    fn on_job_complete(&self, report: &JobReport) {
        info!(
            target: "alphabatch::orchestrator",
            job_id = %report.job_id,
            field = %report.source_field,
            status = %report.status,
            alpha_id = report.alpha_id.as_ref().map(|id| id.as_str()),
            persisted = report.persisted,
            message = report.message.as_deref(),
            "job finished"
        );
    }

    fn on_error(&self, message: &str) {
        error!(target: "alphabatch::orchestrator", "{message}");
    }
}
