use serde::Deserialize;
use std::time::Duration;

/// Poster service configuration, read from `TMDB_*` environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct PosterConfig {
    /// API key for the search endpoint; posters are disabled without one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Metadata API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Prefix joined with a result's poster path
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    /// Returned whenever no poster can be fetched
    #[serde(default = "default_placeholder_url")]
    pub placeholder_url: String,

    /// Upper bound for a single poster lookup
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_placeholder_url() -> String {
    "https://via.placeholder.com/500x750?text=No+Poster".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            image_base_url: default_image_base_url(),
            placeholder_url: default_placeholder_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl PosterConfig {
    /// Load configuration from `TMDB_`-prefixed environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        envy::prefixed("TMDB_")
            .from_env::<PosterConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load poster config: {}", e))
    }

    /// API key if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
