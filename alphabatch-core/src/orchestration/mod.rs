//! Batch scheduling and the submit-to-production workflow.

pub mod config;
pub mod observer;
pub mod orchestrator;
pub mod submission;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub use config::{OrchestratorConfig, SubmissionConfig};
pub use observer::{JobReport, RunObserver, TracingObserver};
pub use orchestrator::{RunPlan, RunSummary, SimulationOrchestrator};
pub use submission::{
    SubmissionOutcome, SubmissionPoller, SubmissionReport, SubmissionWorkflow,
};

/// Sleeps for `duration` unless `cancel` fires first.
///
/// Returns `false` when the wait was cut short by cancellation.
pub(crate) async fn sleep_or_cancel(
    duration: Duration,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
