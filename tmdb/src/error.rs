use thiserror::Error;

use crate::config::ConfigError;

/// Failures setting up the TMDb provider. Request-time failures are
/// reported as [`actor_link_core::ProviderError`].
#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
