use serde::Deserialize;
use std::time::Duration;

/// Poster service configuration, read from `TMDB_*` environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct PosterConfig {
    /// API key; posters are disabled when unset or empty
    #[serde(default)]
    pub api_key: Option<String>,

    /// Catalog service base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Prefix joined with the returned `poster_path`
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,

    #[serde(default = "default_language")]
    pub language: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of memoized lookups
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_language() -> String {
    "en-US".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_cache_capacity() -> usize {
    1024
}

impl Default for PosterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            image_base_url: default_image_base_url(),
            language: default_language(),
            timeout_ms: default_timeout_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl PosterConfig {
    /// Load configuration from `TMDB_*` environment variables (and `.env`)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("TMDB_")
            .from_env::<PosterConfig>()
            .map_err(|e| anyhow::anyhow!("Failed to load poster config: {}", e))
    }

    /// Config pointing at `api_url` with the given key; everything else default
    pub fn with_api_key(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    /// The API key, if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
