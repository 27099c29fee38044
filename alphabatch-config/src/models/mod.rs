//! Configuration model for alphabatch.

pub mod credentials;

use std::path::PathBuf;

use alphabatch_core::orchestration::{OrchestratorConfig, SubmissionConfig};
use alphabatch_core::transport::brain::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

pub use credentials::CredentialsConfig;

/// Source that produced the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    /// File named on the command line.
    Explicit(PathBuf),
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("built-in defaults"),
            ConfigSource::Explicit(path) => write!(f, "{}", path.display()),
            ConfigSource::EnvPath(path) => {
                write!(f, "$ALPHABATCH_CONFIG_PATH ({})", path.display())
            }
            ConfigSource::EnvInline => f.write_str("$ALPHABATCH_CONFIG_JSON"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Everything the command line tool needs to run.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub credentials: CredentialsConfig,
    pub paths: PathsConfig,
    pub orchestrator: OrchestratorConfig,
    pub submission: SubmissionConfig,
}

/// Remote service endpoint and HTTP timeouts.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Timeout for a single request (seconds).
    pub request_timeout_secs: u64,
    /// Timeout for one poll request (seconds). Polls should fail fast so a
    /// stuck request does not stall the whole cycle.
    pub poll_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            poll_timeout_secs: 10,
        }
    }
}

/// On-disk locations the tool reads and writes.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub results_file: PathBuf,
    pub templates_file: PathBuf,
    /// Directory of `<dataset>.csv` identifier lists.
    pub identifiers_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            results_file: PathBuf::from("data/processed/backtest_results.csv"),
            templates_file: PathBuf::from("config/alpha_templates.json"),
            identifiers_dir: PathBuf::from("data/raw"),
        }
    }
}
