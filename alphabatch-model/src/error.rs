use std::fmt::{self, Display};

use crate::job::JobStatus;

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
    InvalidTransition {
        from: JobStatus,
        to: JobStatus,
    },
    UnknownStatus(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{field} must be within {min}..={max}, got {value}"
            ),
            ModelError::InvalidTransition { from, to } => {
                write!(f, "invalid job transition {from} -> {to}")
            }
            ModelError::UnknownStatus(raw) => {
                write!(f, "unknown job status: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
