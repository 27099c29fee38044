/// Classification of a submit-to-production accept attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptResponse {
    Accepted,
    AlreadySubmitted,
    Rejected,
    /// Any other status code; the attempt is consumed and retried.
    Other(u16),
}

impl AcceptResponse {
    pub fn from_status(status: u16) -> Self {
        match status {
            201 => AcceptResponse::Accepted,
            400 => AcceptResponse::AlreadySubmitted,
            403 => AcceptResponse::Rejected,
            other => AcceptResponse::Other(other),
        }
    }
}

/// Result of one submit-to-production status poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmissionCheck {
    /// Still processing; wait this many seconds before asking again.
    Pending { retry_after_secs: f64 },
    Done,
    Failed { status: u16 },
}

impl SubmissionCheck {
    /// Builds a check from a response status and its `Retry-After` hint.
    pub fn from_response(status: u16, retry_after_secs: Option<f64>) -> Self {
        if status != 200 {
            return SubmissionCheck::Failed { status };
        }
        match retry_after_secs {
            Some(secs) if secs > 0.0 => SubmissionCheck::Pending {
                retry_after_secs: secs,
            },
            _ => SubmissionCheck::Done,
        }
    }
}
