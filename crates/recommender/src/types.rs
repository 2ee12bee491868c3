//! Result and error types for recommendation lookups.

use data_loader::{Movie, MovieId, Position};
use thiserror::Error;

/// One neighbour of the query movie
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    /// Catalog / matrix position of the recommended movie
    pub position: Position,
    pub movie_id: MovieId,
    pub title: String,
    /// Similarity of the query movie to this one
    pub score: f32,
}

impl Recommendation {
    pub fn new(position: Position, movie: &Movie, score: f32) -> Self {
        Self {
            position,
            movie_id: movie.id,
            title: movie.title.clone(),
            score,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    /// The queried title is not in the catalog
    #[error("Movie not found: {title}")]
    NotFound { title: String },

    /// Position outside the catalog
    #[error("Position {position} out of range (catalog has {len} movies)")]
    OutOfRange { position: Position, len: usize },
}
