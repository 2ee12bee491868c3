//! HTTP poster resolver with a bounded memo.

use crate::config::PosterConfig;
use crate::{PosterError, PosterLookup};
use async_trait::async_trait;
use data_loader::MovieId;
use lru::LruCache;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

/// The part of the movie details response we care about
#[derive(Debug, Deserialize)]
struct MovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

/// Resolves poster URLs through the external catalog service.
///
/// Every outcome, including "no poster", is memoized per movie id until
/// evicted from the LRU.
pub struct PosterResolver {
    http_client: HttpClient,
    config: PosterConfig,
    cache: Mutex<LruCache<MovieId, Option<String>>>,
}

impl PosterResolver {
    /// Build a resolver; fails only if the HTTP client can't be constructed
    pub fn new(config: PosterConfig) -> Result<Self, PosterError> {
        let http_client = HttpClient::builder().timeout(config.timeout()).build()?;
        let capacity = NonZeroUsize::new(config.cache_capacity).unwrap_or(NonZeroUsize::MIN);

        if config.api_key().is_some() {
            info!(
                api_url = %config.api_url,
                timeout_ms = config.timeout_ms,
                cache_capacity = capacity.get(),
                "Poster lookups enabled"
            );
        } else {
            info!("No catalog API key configured; poster lookups disabled");
        }

        Ok(Self {
            http_client,
            config,
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    /// Whether lookups will hit the network at all
    pub fn is_enabled(&self) -> bool {
        self.config.api_key().is_some()
    }

    pub fn config(&self) -> &PosterConfig {
        &self.config
    }

    /// Memoized outcome for `movie_id`, if any; doesn't touch recency
    pub fn cached(&self, movie_id: MovieId) -> Option<Option<String>> {
        self.lock_cache().peek(&movie_id).cloned()
    }

    /// Number of memoized lookups
    pub fn cache_len(&self) -> usize {
        self.lock_cache().len()
    }

    /// Memo lookup that also marks the entry as recently used
    fn memo_get(&self, movie_id: MovieId) -> Option<Option<String>> {
        self.lock_cache().get(&movie_id).cloned()
    }

    fn lock_cache(&self) -> MutexGuard<'_, LruCache<MovieId, Option<String>>> {
        // The memo is always left consistent; a panic elsewhere can't corrupt it
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch the poster URL for one movie from the catalog service
    async fn fetch(&self, api_key: &str, movie_id: MovieId) -> Result<String, PosterError> {
        let url = format!(
            "{}/movie/{}",
            self.config.api_url.trim_end_matches('/'),
            movie_id
        );

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key), ("language", self.config.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PosterError::Status(status));
        }

        let details: MovieDetails = response.json().await.map_err(PosterError::Decode)?;

        match details.poster_path {
            Some(path) if !path.is_empty() => {
                Ok(format!("{}{}", self.config.image_base_url, path))
            }
            _ => Err(PosterError::MissingPoster(movie_id)),
        }
    }
}

#[async_trait]
impl PosterLookup for PosterResolver {
    #[instrument(skip(self))]
    async fn resolve(&self, movie_id: MovieId) -> Option<String> {
        let api_key = self.config.api_key()?;

        if let Some(hit) = self.memo_get(movie_id) {
            debug!("Poster cache hit");
            return hit;
        }

        let poster = match self.fetch(api_key, movie_id).await {
            Ok(url) => Some(url),
            Err(err @ PosterError::MissingPoster(_)) => {
                debug!("{}", err);
                None
            }
            Err(err) => {
                warn!("Poster unavailable for movie {}: {}", movie_id, err);
                None
            }
        };

        self.lock_cache().put(movie_id, poster.clone());
        poster
    }
}
