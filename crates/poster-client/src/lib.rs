//! Poster lookup client for the external movie catalog service.
//!
//! This crate turns a movie id into a displayable poster URL:
//! - `GET {api_url}/movie/{id}?api_key=..&language=..`
//! - read the optional `poster_path` from the JSON body
//! - prefix it with the image base URL
//!
//! Lookups never fail outward. Timeouts, bad statuses, malformed bodies and
//! missing posters all come back as `None`; the reason is only logged.

use async_trait::async_trait;
use data_loader::MovieId;
use thiserror::Error;

pub mod config;
pub mod resolver;

pub use config::PosterConfig;
pub use resolver::PosterResolver;

/// Why a poster couldn't be resolved. Never crosses [`PosterLookup`].
#[derive(Error, Debug)]
pub enum PosterError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog service returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid response from catalog service: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("No poster listed for movie {0}")]
    MissingPoster(MovieId),
}

/// Anything that can map a movie id to a poster URL
#[async_trait]
pub trait PosterLookup: Send + Sync {
    /// Poster URL for `movie_id`, or `None` if there isn't one (for any reason)
    async fn resolve(&self, movie_id: MovieId) -> Option<String>;
}

/// Lookup that never finds a poster; used when posters are switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPosters;

#[async_trait]
impl PosterLookup for NoPosters {
    async fn resolve(&self, _movie_id: MovieId) -> Option<String> {
        None
    }
}
