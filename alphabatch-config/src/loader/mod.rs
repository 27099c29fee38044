//! Configuration discovery.
//!
//! Evaluation order:
//! 1) an explicit path (command line),
//! 2) `$ALPHABATCH_CONFIG_PATH` (TOML or JSON file),
//! 3) `$ALPHABATCH_CONFIG_JSON` (inline JSON),
//! 4) the first existing default file,
//! 5) built-in defaults.

pub mod error;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::models::{AppConfig, ConfigSource};
use crate::validation::validate;
use error::ConfigLoadError;

pub const CONFIG_PATH_ENV: &str = "ALPHABATCH_CONFIG_PATH";
pub const CONFIG_JSON_ENV: &str = "ALPHABATCH_CONFIG_JSON";

const DEFAULT_FILES: &[&str] = &[
    "alphabatch.toml",
    "alphabatch.json",
    "config/alphabatch.toml",
    "config/alphabatch.json",
];

/// Validated configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: AppConfig,
    pub source: ConfigSource,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct ConfigLoader {
    env: EnvLookup,
    root: PathBuf,
    explicit: Option<PathBuf>,
    load_dotenv: bool,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("root", &self.root)
            .field("explicit", &self.explicit)
            .field("load_dotenv", &self.load_dotenv)
            .finish()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment and resolving default files
    /// against the working directory.
    pub fn new() -> Self {
        Self {
            env: Box::new(|key| std::env::var(key).ok()),
            root: PathBuf::from("."),
            explicit: None,
            load_dotenv: true,
        }
    }

    pub fn with_env_lookup(
        mut self,
        env: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.env = Box::new(env);
        self.load_dotenv = false;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn env_var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|value| !value.trim().is_empty())
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        if self.load_dotenv {
            match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "loaded .env"),
                Err(err) if err.not_found() => {}
                Err(err) => return Err(err.into()),
            }
        }

        let (config, source) = self.discover()?;
        validate(&config)?;
        info!(source = %source, "configuration loaded");
        Ok(ConfigLoad { config, source })
    }

    fn discover(&self) -> Result<(AppConfig, ConfigSource), ConfigLoadError> {
        if let Some(path) = &self.explicit {
            let config = load_from_file(path)?;
            return Ok((config, ConfigSource::Explicit(path.clone())));
        }

        if let Some(path) = self.env_var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(raw) = self.env_var(CONFIG_JSON_ENV) {
            let config = parse_json(&raw, CONFIG_JSON_ENV)?;
            return Ok((config, ConfigSource::EnvInline));
        }

        if let Some(path) = self.find_default_file() {
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((AppConfig::default(), ConfigSource::Default))
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_FILES
            .iter()
            .map(|candidate| self.root.join(candidate))
            .find(|path| path.is_file())
    }
}

pub fn load_from_file(path: &Path) -> Result<AppConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
    let origin = path.display().to_string();

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents, &origin),
        Some("toml") | Some("tml") => {
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                origin,
                message: err.to_string(),
            })
        }
        _ => parse_from_str(&contents, &origin),
    }
}

/// Tries TOML first, then JSON.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> Result<AppConfig, ConfigLoadError> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| ConfigLoadError::Parse {
            origin: origin.to_string(),
            message: format!("toml error: {toml_err}; json error: {json_err}"),
        })
    })
}

pub fn parse_json(raw: &str, origin: &str) -> Result<AppConfig, ConfigLoadError> {
    serde_json::from_str(raw).map_err(|err| ConfigLoadError::Parse {
        origin: origin.to_string(),
        message: err.to_string(),
    })
}
