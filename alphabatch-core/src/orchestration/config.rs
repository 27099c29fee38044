use std::time::Duration;

use alphabatch_model::MaxConcurrency;
use serde::{Deserialize, Serialize};

/// Scheduling knobs for one batch run. Immutable once the run starts.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on simulations in flight, locally and on the service.
    pub max_concurrency: MaxConcurrency,
    /// Pause between scheduling cycles (milliseconds).
    pub cycle_interval_ms: u64,
    /// Pause before re-checking a saturated service that has none of our
    /// jobs in flight (milliseconds).
    pub saturation_backoff_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: MaxConcurrency::default(),
            cycle_interval_ms: 5_000,
            saturation_backoff_ms: 30_000,
        }
    }
}

impl OrchestratorConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn saturation_backoff(&self) -> Duration {
        Duration::from_millis(self.saturation_backoff_ms)
    }
}

/// Retry/poll policy of the submit-to-production workflow.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SubmissionConfig {
    pub max_accept_attempts: u16,
    pub accept_retry_interval_ms: u64,
    /// Emit an elapsed-time heartbeat every N status polls.
    pub heartbeat_every: u32,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_accept_attempts: 5,
            accept_retry_interval_ms: 3_000,
            heartbeat_every: 75,
        }
    }
}

impl SubmissionConfig {
    pub fn accept_retry_interval(&self) -> Duration {
        Duration::from_millis(self.accept_retry_interval_ms)
    }
}
