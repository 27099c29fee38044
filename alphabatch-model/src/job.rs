use std::{fmt, str::FromStr};

use crate::error::{ModelError, Result};
use crate::ids::JobId;

/// Lifecycle states of a single simulation job.
///
/// ```text
/// PENDING -> SUBMITTING -> ACTIVE | SKIPPED | SUBMIT_FAILED
/// SUBMITTING -> PENDING            (rate limited, retried next cycle)
/// ACTIVE -> ACTIVE | COMPLETE | ERROR | LOST
/// PENDING | ACTIVE -> CANCELLED    (run abandoned)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum JobStatus {
    Pending,
    Submitting,
    Active,
    Complete,
    Error,
    Skipped,
    SubmitFailed,
    Lost,
    Cancelled,
}

impl JobStatus {
    pub const TERMINAL: [JobStatus; 6] = [
        JobStatus::Complete,
        JobStatus::Error,
        JobStatus::Skipped,
        JobStatus::SubmitFailed,
        JobStatus::Lost,
        JobStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        Self::TERMINAL.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Submitting => "SUBMITTING",
            JobStatus::Active => "ACTIVE",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Error => "ERROR",
            JobStatus::Skipped => "SKIPPED",
            JobStatus::SubmitFailed => "SUBMIT_FAILED",
            JobStatus::Lost => "LOST",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Submitting)
                | (Pending, Cancelled)
                | (Submitting, Active)
                | (Submitting, Skipped)
                | (Submitting, SubmitFailed)
                | (Submitting, Pending)
                | (Active, Active)
                | (Active, Complete)
                | (Active, Error)
                | (Active, Lost)
                | (Active, Cancelled)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        let upper = raw.trim().to_ascii_uppercase();
        [
            JobStatus::Pending,
            JobStatus::Submitting,
            JobStatus::Active,
            JobStatus::Complete,
            JobStatus::Error,
            JobStatus::Skipped,
            JobStatus::SubmitFailed,
            JobStatus::Lost,
            JobStatus::Cancelled,
        ]
        .into_iter()
        .find(|status| status.as_str() == upper)
        .ok_or_else(|| ModelError::UnknownStatus(raw.to_string()))
    }
}

/// One unit of work: a template expression bound to one data identifier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Job {
    pub id: JobId,
    pub source_field: String,
    /// Empty until the job has been through substitution.
    pub expression: String,
    pub status: JobStatus,
}

impl Job {
    pub fn pending(id: JobId, source_field: impl Into<String>) -> Self {
        Self {
            id,
            source_field: source_field.into(),
            expression: String::new(),
            status: JobStatus::Pending,
        }
    }

    /// Moves the job to `next`, rejecting edges the lifecycle does not allow.
    pub fn transition(&mut self, next: JobStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
