use alphabatch_model::MaxConcurrency;
use thiserror::Error;
use url::Url;

use crate::models::AppConfig;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("api.base_url '{value}' is not a valid URL: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error(
        "orchestrator.max_concurrency must be between {} and {}",
        MaxConcurrency::MIN,
        MaxConcurrency::MAX
    )]
    ConcurrencyOutOfRange,
}

/// Rejects settings the run loop cannot work with.
///
/// `max_concurrency` is range-checked while deserializing; the check here
/// covers configs built in code.
pub fn validate(config: &AppConfig) -> Result<(), ConfigGuardRailError> {
    let base = config.api.base_url.trim();
    let url = Url::parse(base).map_err(|err| ConfigGuardRailError::InvalidBaseUrl {
        value: base.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigGuardRailError::InvalidBaseUrl {
            value: base.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    let concurrency = u8::from(config.orchestrator.max_concurrency);
    if MaxConcurrency::new(concurrency).is_err() {
        return Err(ConfigGuardRailError::ConcurrencyOutOfRange);
    }

    let non_zero: [(&'static str, u64); 6] = [
        ("api.request_timeout_secs", config.api.request_timeout_secs),
        ("api.poll_timeout_secs", config.api.poll_timeout_secs),
        ("orchestrator.cycle_interval_ms", config.orchestrator.cycle_interval_ms),
        (
            "orchestrator.saturation_backoff_ms",
            config.orchestrator.saturation_backoff_ms,
        ),
        (
            "submission.accept_retry_interval_ms",
            config.submission.accept_retry_interval_ms,
        ),
        (
            "submission.max_accept_attempts",
            u64::from(config.submission.max_accept_attempts),
        ),
    ];
    if let Some(&(field, _)) = non_zero.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigGuardRailError::ZeroValue { field });
    }

    Ok(())
}
