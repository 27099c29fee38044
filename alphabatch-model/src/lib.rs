//! Core data model definitions shared across alphabatch crates.
#![allow(missing_docs)]

pub mod checks;
pub mod error;
pub mod ids;
pub mod job;
pub mod limits;
pub mod record;
pub mod settings;
pub mod simulation;
pub mod submission;

// Intentionally curated re-exports for downstream consumers.
pub use checks::{CheckOutcome, CheckResult, GatedCheck};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{AlphaId, JobId, PollLocator};
pub use job::{Job, JobStatus};
pub use limits::MaxConcurrency;
pub use record::{CheckValues, ResultRecord};
pub use settings::{SimulationKind, SimulationRequest, SimulationSettings};
pub use simulation::{
    AlphaResult, InSampleSummary, PollSnapshot, RegularCode,
    RunningSimulation, SimulationProgress,
};
pub use submission::{AcceptResponse, SubmissionCheck};
