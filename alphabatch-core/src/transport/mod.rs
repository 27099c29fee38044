//! Seam between the scheduling core and the remote simulation service.
//!
//! [`SimulationTransport`] covers everything the orchestrator needs and
//! [`SubmissionTransport`] the submit-to-production workflow. The HTTP
//! implementation lives in [`brain`]; tests substitute scripted fakes.

pub mod brain;

use alphabatch_model::{
    AcceptResponse, AlphaId, AlphaResult, PollLocator, PollSnapshot,
    SimulationRequest, SubmissionCheck,
};
use async_trait::async_trait;
use thiserror::Error;

pub use brain::{BrainClient, BrainClientConfig, Credentials};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication rejected")]
    Unauthorized,

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("network error: {0}")]
    Network(reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::Protocol(err.to_string())
        } else {
            TransportError::Network(err)
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Protocol(format!("malformed JSON: {err}"))
    }
}

/// Outcome of a submit-simulation call that reached the service.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted(PollLocator),
    /// The service refused with 429; the job should be retried later.
    RateLimited,
    Rejected { status: u16, body: String },
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SimulationTransport: Send + Sync {
    async fn submit_simulation(
        &self,
        request: &SimulationRequest,
    ) -> Result<SubmitOutcome, TransportError>;

    /// Reads the current state of a submitted simulation.
    ///
    /// Returns [`TransportError::NotFound`] once the locator is gone.
    async fn poll_simulation(
        &self,
        locator: &PollLocator,
    ) -> Result<PollSnapshot, TransportError>;

    async fn fetch_alpha(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<AlphaResult, TransportError>;

    /// Number of simulations the service currently reports as running for
    /// this account.
    async fn running_simulations(&self) -> Result<usize, TransportError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn submit_alpha(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<AcceptResponse, TransportError>;

    async fn check_submission(
        &self,
        alpha_id: &AlphaId,
    ) -> Result<SubmissionCheck, TransportError>;
}
