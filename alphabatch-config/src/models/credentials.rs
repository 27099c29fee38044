use std::fs;
use std::path::PathBuf;

use alphabatch_core::transport::Credentials;
use serde::{Deserialize, Serialize};

use crate::loader::error::ConfigLoadError;

pub const USERNAME_ENV: &str = "ALPHABATCH_USERNAME";
pub const PASSWORD_ENV: &str = "ALPHABATCH_PASSWORD";

/// Where the account credentials come from.
///
/// Precedence: environment, inline values, then `credentials_file`, a JSON
/// array `["username", "password"]`.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub credentials_file: Option<PathBuf>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("credentials_file", &self.credentials_file)
            .finish()
    }
}

impl CredentialsConfig {
    pub fn resolve(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, ConfigLoadError> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let (Some(username), Some(password)) =
            (non_empty(env(USERNAME_ENV)), non_empty(env(PASSWORD_ENV)))
        {
            return Ok(Credentials::new(username, password));
        }

        if let (Some(username), Some(password)) = (
            non_empty(self.username.clone()),
            non_empty(self.password.clone()),
        ) {
            return Ok(Credentials::new(username, password));
        }

        let Some(path) = &self.credentials_file else {
            return Err(ConfigLoadError::MissingCredentials);
        };
        let raw = fs::read_to_string(path).map_err(|source| {
            ConfigLoadError::CredentialsFileIo {
                path: path.clone(),
                source,
            }
        })?;
        let [username, password]: [String; 2] = serde_json::from_str(&raw)
            .map_err(|source| ConfigLoadError::CredentialsFileFormat {
                path: path.clone(),
                source,
            })?;
        Ok(Credentials::new(username, password))
    }
}
