//! TMDb metadata provider for actor-link.
//!
//! Implements [`actor_link_core::MetadataProvider`] over the TMDb v3 REST
//! API, with bounded retries for rate limiting and transient failures.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;


pub use client::{image_url, RetryPolicy, TmdbClient};
pub use config::{ConfigError, TmdbConfig};
pub use error::TmdbError;

pub type Result<T> = std::result::Result<T, TmdbError>;
