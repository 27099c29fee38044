use alphabatch_model::ModelError;
use thiserror::Error;

use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Substitution of '{identifier}' produced an empty expression")]
    EmptyExpression { identifier: String },

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Identifier catalog error: {0}")]
    Catalog(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BatchError>;
