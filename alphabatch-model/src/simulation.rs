use crate::checks::CheckResult;
use crate::ids::AlphaId;

/// Body of a simulation poll response.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationProgress {
    pub progress: Option<f64>,
    pub status: Option<String>,
    pub message: Option<String>,
    pub stage: Option<String>,
    /// Result id, present once the simulation produced an alpha.
    #[cfg_attr(feature = "serde", serde(rename = "alpha"))]
    pub result_id: Option<AlphaId>,
}

/// One poll observation: the response body plus the server's retry hint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollSnapshot {
    pub body: SimulationProgress,
    /// `Retry-After` in seconds, when the server sent one.
    pub retry_after_secs: Option<f64>,
}

impl PollSnapshot {
    pub fn new(body: SimulationProgress, retry_after_secs: Option<f64>) -> Self {
        Self {
            body,
            retry_after_secs,
        }
    }

    fn status_is(&self, expected: &str) -> bool {
        self.body
            .status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case(expected))
    }

    pub fn is_error(&self) -> bool {
        self.status_is("ERROR")
    }

    /// Completion is signalled by `status == COMPLETE`, by `progress == 1.0`,
    /// or by a zero retry hint on a response that already names its result.
    pub fn is_complete(&self) -> bool {
        if self.is_error() {
            return false;
        }
        if self.status_is("COMPLETE") {
            return true;
        }
        if self.body.progress.is_some_and(|progress| progress >= 1.0) {
            return true;
        }
        let settled = self.retry_after_secs.unwrap_or(0.0) <= 0.0;
        settled && self.body.result_id.as_ref().is_some_and(|id| !id.is_empty())
    }

    /// Progress clamped into `[0, 1]`, if the server reported a number.
    pub fn fraction(&self) -> Option<f64> {
        self.body
            .progress
            .filter(|progress| progress.is_finite())
            .map(|progress| progress.clamp(0.0, 1.0))
    }

    pub fn message(&self) -> &str {
        self.body.message.as_deref().unwrap_or("unknown error")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RegularCode {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct InSampleSummary {
    pub checks: Vec<CheckResult>,
}

/// Full result of an evaluated alpha, as fetched by id.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlphaResult {
    pub id: AlphaId,
    #[cfg_attr(feature = "serde", serde(rename = "dateCreated", default))]
    pub created_at: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub regular: RegularCode,
    #[cfg_attr(feature = "serde", serde(rename = "is", default))]
    pub in_sample: InSampleSummary,
}

impl AlphaResult {
    pub fn formula(&self) -> &str {
        &self.regular.code
    }

    pub fn checks(&self) -> &[CheckResult] {
        &self.in_sample.checks
    }
}

/// Item of the running-simulations listing. Only `status` matters.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunningSimulation {
    pub id: Option<String>,
    pub status: String,
}

impl RunningSimulation {
    pub fn is_running(&self) -> bool {
        self.status.eq_ignore_ascii_case("RUNNING")
    }
}
