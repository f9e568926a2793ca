use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use actor_link_core::{EntityId, MetadataProvider, MovieDetail, Node, PersonDetail, ProviderError};

use crate::config::TmdbConfig;
use crate::types::{CreditsResponse, MovieResponse, PersonResponse};

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";

/// Full image URL for a profile or poster path, e.g. `size = "w185"`.
pub fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}{}{}", IMAGE_BASE, size, p))
}

/// Exponential backoff for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based). A server-provided
    /// `Retry-After` replaces the computed delay; both are capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32, error: &ProviderError) -> Duration {
        let computed = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)));
        let delay = match error {
            ProviderError::RateLimited {
                retry_after: Some(after),
            } => *after,
            _ => computed,
        };
        delay.min(self.max_delay)
    }
}

impl From<&TmdbConfig> for RetryPolicy {
    fn from(config: &TmdbConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay(),
            max_delay: config.retry_max_delay(),
        }
    }
}

/// TMDb v3 client implementing [`MetadataProvider`].
///
/// Rate-limited (429), 5xx and transport failures are retried according to
/// the [`RetryPolicy`]; the last error is returned once retries run out.
#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> crate::Result<Self> {
        let http = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a client around an existing `reqwest::Client`.
    pub fn with_client(http: Client, config: &TmdbConfig) -> Self {
        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            retry: RetryPolicy::from(config),
        }
    }

    /// GET `path` and decode it, retrying transient failures.
    /// `subject` is the entity the request is about, for NotFound reporting.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, subject: Node) -> Result<T, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.get_once(path, subject).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt, &err);
                    attempt += 1;
                    warn!(
                        %subject,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "TMDb request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str, subject: Node) -> Result<T, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%subject, path, "TMDb request");

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::not_found(subject));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }
        if status.is_server_error() {
            return Err(ProviderError::Network(format!("HTTP {} from {}", status, path)));
        }
        if !status.is_success() {
            return Err(ProviderError::InvalidResponse(format!(
                "unexpected HTTP {} from {}",
                status, path
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.without_url().to_string()))?;
        serde_json::from_slice(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn person_movie_ids(&self, person_id: EntityId) -> Result<Vec<EntityId>, ProviderError> {
        let credits: CreditsResponse = self
            .get_json(&format!("/person/{}/movie_credits", person_id), Node::Person(person_id))
            .await?;
        Ok(credits.ids())
    }

    async fn movie_cast_ids(&self, movie_id: EntityId) -> Result<Vec<EntityId>, ProviderError> {
        let credits: CreditsResponse = self
            .get_json(&format!("/movie/{}/credits", movie_id), Node::Movie(movie_id))
            .await?;
        Ok(credits.ids())
    }

    async fn person_detail(&self, person_id: EntityId) -> Result<PersonDetail, ProviderError> {
        let person: PersonResponse = self
            .get_json(&format!("/person/{}", person_id), Node::Person(person_id))
            .await?;
        Ok(person.into())
    }

    async fn movie_detail(&self, movie_id: EntityId) -> Result<MovieDetail, ProviderError> {
        let movie: MovieResponse = self
            .get_json(&format!("/movie/{}", movie_id), Node::Movie(movie_id))
            .await?;
        Ok(movie.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let err = ProviderError::Network("reset".into());
        let p = policy();
        assert_eq!(p.delay_for(0, &err), Duration::from_millis(100));
        assert_eq!(p.delay_for(1, &err), Duration::from_millis(200));
        assert_eq!(p.delay_for(2, &err), Duration::from_millis(400));
        assert_eq!(p.delay_for(3, &err), Duration::from_millis(500));
        assert_eq!(p.delay_for(40, &err), Duration::from_millis(500));
    }

    #[test]
    fn test_retry_after_respected_but_capped() {
        let p = policy();
        let short = ProviderError::RateLimited {
            retry_after: Some(Duration::from_millis(50)),
        };
        assert_eq!(p.delay_for(2, &short), Duration::from_millis(50));
        let long = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        };
        assert_eq!(p.delay_for(0, &long), Duration::from_millis(500));
    }

    #[test]
    fn test_image_url() {
        assert_eq!(
            image_url(Some("/abc.jpg"), "w185").as_deref(),
            Some("https://image.tmdb.org/t/p/w185/abc.jpg")
        );
        assert!(image_url(None, "w185").is_none());
        assert!(image_url(Some(""), "w185").is_none());
    }
}
