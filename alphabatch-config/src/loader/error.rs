use std::path::PathBuf;

use thiserror::Error;

use crate::validation::ConfigGuardRailError;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read configuration {path}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration from {origin}: {message}")]
    Parse { origin: String, message: String },
    #[error("no credentials configured; set ALPHABATCH_USERNAME/ALPHABATCH_PASSWORD or credentials.credentials_file")]
    MissingCredentials,
    #[error("failed to read credentials file {path}")]
    CredentialsFileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credentials file {path} must hold a JSON array [username, password]")]
    CredentialsFileFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
