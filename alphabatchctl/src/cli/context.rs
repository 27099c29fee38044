use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alphabatch_config::{AppConfig, ConfigLoader, ConfigSource};
use alphabatch_core::{BrainClient, BrainClientConfig, ResultStore};
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// Loaded configuration plus the collaborators commands share.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub source: ConfigSource,
    loader: ConfigLoader,
}

impl AppContext {
    pub fn load(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let loader = ConfigLoader::new().with_explicit_path(explicit);
        let load = loader.load().context("failed to load configuration")?;
        Ok(Self {
            config: load.config,
            source: load.source,
            loader,
        })
    }

    pub fn store(&self) -> ResultStore {
        ResultStore::new(&self.config.paths.results_file)
    }

    /// Builds the HTTP client and opens an authenticated session.
    pub async fn connect(&self) -> anyhow::Result<Arc<BrainClient>> {
        let api = &self.config.api;
        let base_url = Url::parse(api.base_url.trim())
            .with_context(|| format!("invalid api.base_url '{}'", api.base_url))?;
        let client = BrainClient::new(
            BrainClientConfig::new(base_url)
                .with_request_timeout(Duration::from_secs(api.request_timeout_secs))
                .with_poll_timeout(Duration::from_secs(api.poll_timeout_secs)),
        )
        .context("failed to build HTTP client")?;

        let credentials = self
            .config
            .credentials
            .resolve(|key| self.loader.env_var(key))
            .context("failed to resolve credentials")?;
        client
            .authenticate(&credentials)
            .await
            .context("authentication failed")?;
        info!(config = %self.source, "session established");
        Ok(Arc::new(client))
    }
}

/// Token cancelled on the first Ctrl-C.
pub fn ctrl_c_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("interrupt received, stopping after the current step");
                trigger.cancel();
            }
            Err(err) => warn!(error = %err, "could not listen for Ctrl-C"),
        }
    });
    token
}
