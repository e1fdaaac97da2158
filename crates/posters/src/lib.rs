//! Poster lookup for recommended movies.
//!
//! This crate is the boundary to the external metadata service. Callers
//! depend only on the [`PosterFetcher`] trait, which never fails: any
//! problem with the remote call turns into a [`Poster::Placeholder`].
//!
//! - [`TmdbPosterClient`]: searches TMDB by title and builds an image URL
//! - [`PlaceholderPosters`]: used when no API key is configured

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub mod config;
pub mod tmdb;

pub use config::PosterConfig;
pub use tmdb::TmdbPosterClient;

/// Errors that can occur when looking up a poster.
///
/// These never leave [`PosterFetcher::fetch_poster_url`]; they are logged
/// and replaced by the placeholder.
#[derive(Error, Debug)]
pub enum PosterError {
    #[error("No API key configured for the poster service")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Poster lookup timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Poster service returned status {0}")]
    Status(u16),

    #[error("Invalid response from poster service: {0}")]
    MalformedResponse(String),

    #[error("No search results for '{0}'")]
    NoResults(String),

    #[error("First search result for '{0}' has no poster")]
    MissingPosterPath(String),

    #[error("Empty title")]
    EmptyTitle,
}

/// Image to show for a movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poster {
    /// A poster found by the metadata service
    Image(String),
    /// The configured fallback image
    Placeholder(String),
}

impl Poster {
    pub fn url(&self) -> &str {
        match self {
            Poster::Image(url) | Poster::Placeholder(url) => url,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Poster::Placeholder(_))
    }
}

/// Something that can find a poster image for a movie title
#[async_trait]
pub trait PosterFetcher: Send + Sync {
    /// Poster URL for `title`, or the placeholder on any failure
    async fn fetch_poster_url(&self, title: &str) -> Poster;

    /// Fetcher name for logging
    fn name(&self) -> &'static str;
}

/// Fetcher that never calls out and always answers with the placeholder
#[derive(Debug, Clone)]
pub struct PlaceholderPosters {
    placeholder_url: String,
}

impl PlaceholderPosters {
    pub fn new(placeholder_url: impl Into<String>) -> Self {
        Self {
            placeholder_url: placeholder_url.into(),
        }
    }
}

#[async_trait]
impl PosterFetcher for PlaceholderPosters {
    async fn fetch_poster_url(&self, _title: &str) -> Poster {
        Poster::Placeholder(self.placeholder_url.clone())
    }

    fn name(&self) -> &'static str {
        "placeholder"
    }
}

/// Pick a fetcher for the given configuration.
///
/// Falls back to [`PlaceholderPosters`] when posters are disabled, no API
/// key is set, or the HTTP client cannot be built.
pub fn build_fetcher(config: &PosterConfig, enabled: bool) -> Arc<dyn PosterFetcher> {
    if !enabled {
        info!("Poster lookups disabled");
        return Arc::new(PlaceholderPosters::new(config.placeholder_url.clone()));
    }

    match TmdbPosterClient::new(config) {
        Ok(client) => {
            info!(api_url = %config.api_url, "Poster lookups enabled");
            Arc::new(client)
        }
        Err(e) => {
            info!("Poster lookups unavailable ({}), using placeholders", e);
            Arc::new(PlaceholderPosters::new(config.placeholder_url.clone()))
        }
    }
}
