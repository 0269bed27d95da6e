use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    cdr::CdrConverter,
    fallback::{FallbackDocument, FallbackError},
    ghostscript::{GhostscriptOutliner, SystemRunner},
    retry::RetryPolicy,
    staging::{Staging, StagingError},
    zamzar::{RemoteConverter, RemoteError, ZamzarClient},
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub staging: Staging,
    pub outliner: Arc<GhostscriptOutliner>,
    pub cdr: Arc<CdrConverter>,
}

impl AppState {
    pub fn new(staging: Staging, outliner: GhostscriptOutliner, cdr: CdrConverter) -> Self {
        Self {
            staging,
            outliner: Arc::new(outliner),
            cdr: Arc::new(cdr),
        }
    }

    /// Wire up the production services described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, InitError> {
        let staging = Staging::new(&config.staging_dir)?;

        let outliner =
            GhostscriptOutliner::new(config.ghostscript_bin.clone(), Arc::new(SystemRunner));

        let remote: Option<Arc<dyn RemoteConverter>> = match config.api_key() {
            Some(key) => {
                let client =
                    ZamzarClient::new(config.zamzar_base_url.as_str(), key, config.remote_timeout())?;
                Some(Arc::new(client) as Arc<dyn RemoteConverter>)
            }
            None => None,
        };
        let policy = RetryPolicy::new(config.poll_max_attempts, config.poll_interval());
        let cdr = CdrConverter::new(remote, policy, FallbackDocument::render()?);

        Ok(Self::new(staging, outliner, cdr))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("Failed to build remote client: {0}")]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Fallback(#[from] FallbackError),
}
