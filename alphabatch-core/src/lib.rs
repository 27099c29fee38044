//! Core library for alphabatch.
//!
//! Drives batches of alpha simulations against a rate-limited remote
//! service: identifiers are substituted into an expression template, each
//! job is submitted and polled under a bounded concurrency budget, and
//! results that pass the check gate are persisted to a CSV result table.
//! Persisted alphas can later be taken through the submit-to-production
//! workflow.
#![allow(missing_docs)]

pub mod catalog;
pub mod error;
pub mod expression;
pub mod orchestration;
pub mod progress;
pub mod store;
pub mod templates;
pub mod transport;
pub mod validation;

pub use error::{BatchError, Result};
pub use orchestration::{
    JobReport, OrchestratorConfig, RunObserver, RunPlan, RunSummary,
    SimulationOrchestrator, SubmissionConfig, SubmissionOutcome,
    SubmissionPoller, SubmissionReport, SubmissionWorkflow, TracingObserver,
};
pub use store::{ResultStore, ResultTable};
pub use transport::{
    BrainClient, BrainClientConfig, Credentials, SimulationTransport,
    SubmissionTransport, SubmitOutcome, TransportError,
};
