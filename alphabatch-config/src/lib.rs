//! Configuration library for alphabatch.
//!
//! Loads the [`AppConfig`] used by the command line tool from an explicit
//! file, the environment, a default file or built-in defaults, and applies
//! guard rails before anything talks to the remote service.
#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, error::ConfigLoadError};
pub use models::{
    ApiConfig, AppConfig, ConfigSource, CredentialsConfig, PathsConfig,
};
pub use validation::{ConfigGuardRailError, validate};
