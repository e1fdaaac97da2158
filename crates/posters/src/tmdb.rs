//! TMDB search-by-title poster client.
//!
//! API flow:
//! 1. `GET {api_url}/search/movie?api_key=..&query=..[&year=..]`
//! 2. Take `results[0].poster_path`
//! 3. Join it onto the image base URL
//!
//! MovieLens titles carry the year in parentheses and move leading articles
//! to the end ("Matrix, The (1999)"), so titles are normalised into a query
//! and an optional year before searching.

use crate::config::PosterConfig;
use crate::{Poster, PosterError, PosterFetcher};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const ARTICLES: &[&str] = &["The", "A", "An"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    poster_path: Option<String>,
}

/// Poster fetcher backed by the TMDB search API
#[derive(Clone)]
pub struct TmdbPosterClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_base_url: String,
    placeholder_url: String,
    timeout: Duration,
}

impl TmdbPosterClient {
    /// Build a client from configuration; requires an API key
    pub fn new(config: &PosterConfig) -> Result<Self, PosterError> {
        let api_key = config.api_key().ok_or(PosterError::MissingApiKey)?;
        let http_client = HttpClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PosterError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            placeholder_url: config.placeholder_url.clone(),
            timeout: config.timeout(),
        })
    }

    /// Search for `title` and return the first result's poster URL
    pub async fn lookup(&self, title: &str) -> Result<String, PosterError> {
        let (query, year) = search_terms(title);
        if query.is_empty() {
            return Err(PosterError::EmptyTitle);
        }

        let url = format!("{}/search/movie", self.api_url);
        let mut params = vec![("api_key", self.api_key.clone()), ("query", query)];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            return Err(PosterError::Status(response.status().as_u16()));
        }

        let body = response.text().await.map_err(classify)?;
        let search: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| PosterError::MalformedResponse(e.to_string()))?;

        let first = search
            .results
            .into_iter()
            .next()
            .ok_or_else(|| PosterError::NoResults(title.to_string()))?;

        let path = first
            .poster_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PosterError::MissingPosterPath(title.to_string()))?;

        Ok(self.image_url(&path))
    }

    fn image_url(&self, poster_path: &str) -> String {
        if poster_path.starts_with('/') {
            format!("{}{}", self.image_base_url, poster_path)
        } else {
            format!("{}/{}", self.image_base_url, poster_path)
        }
    }

    /// Per-call timeout this client was built with
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl PosterFetcher for TmdbPosterClient {
    #[instrument(skip(self))]
    async fn fetch_poster_url(&self, title: &str) -> Poster {
        match self.lookup(title).await {
            Ok(url) => {
                debug!(url = %url, "Found poster");
                Poster::Image(url)
            }
            Err(e) => {
                warn!(error = %e, "Poster lookup failed, using placeholder");
                Poster::Placeholder(self.placeholder_url.clone())
            }
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn classify(err: reqwest::Error) -> PosterError {
    if err.is_timeout() {
        PosterError::Timeout
    } else {
        PosterError::Http(err)
    }
}

/// Split a catalog title into a search query and release year.
///
/// "Matrix, The (1999)" -> ("The Matrix", Some(1999))
pub fn search_terms(title: &str) -> (String, Option<u16>) {
    let mut name = title.trim();
    let mut year = None;

    if let Some(stripped) = name.strip_suffix(')') {
        if let Some(open) = stripped.rfind('(') {
            if let Ok(parsed) = stripped[open + 1..].trim().parse::<u16>() {
                year = Some(parsed);
                name = stripped[..open].trim_end();
            }
        }
    }

    for article in ARTICLES {
        let suffix = format!(", {}", article);
        if let Some(base) = name.strip_suffix(suffix.as_str()) {
            return (format!("{} {}", article, base.trim()), year);
        }
    }

    (name.to_string(), year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_terms_moves_trailing_article() {
        assert_eq!(
            search_terms("Matrix, The (1999)"),
            ("The Matrix".to_string(), Some(1999))
        );
        assert_eq!(
            search_terms("American President, The (1995)"),
            ("The American President".to_string(), Some(1995))
        );
        assert_eq!(
            search_terms("Beautiful Mind, A (2001)"),
            ("A Beautiful Mind".to_string(), Some(2001))
        );
    }

    #[test]
    fn test_search_terms_without_year() {
        assert_eq!(search_terms("  Heat "), ("Heat".to_string(), None));
        assert_eq!(search_terms("Babylon 5"), ("Babylon 5".to_string(), None));
        // Not a year, so it stays in the query
        assert_eq!(
            search_terms("Cosmos (miniseries)"),
            ("Cosmos (miniseries)".to_string(), None)
        );
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = PosterConfig::default();
        assert!(matches!(
            TmdbPosterClient::new(&config),
            Err(PosterError::MissingApiKey)
        ));
    }

    #[test]
    fn test_image_url_joins_paths() {
        let config = PosterConfig {
            api_key: Some("k".to_string()),
            image_base_url: "http://img/t/p/w500/".to_string(),
            ..PosterConfig::default()
        };
        let client = TmdbPosterClient::new(&config).unwrap();

        assert_eq!(client.image_url("/abc.jpg"), "http://img/t/p/w500/abc.jpg");
        assert_eq!(client.image_url("abc.jpg"), "http://img/t/p/w500/abc.jpg");
    }
}
