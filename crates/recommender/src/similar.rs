//! Similar-movie lookup over the precomputed similarity matrix.
//!
//! ## Algorithm
//! 1. Resolve the title to its catalog position (first exact match)
//! 2. Take that movie's row of the similarity matrix
//! 3. Drop the query's own column by position, not by score
//! 4. Stable sort by score, descending, so ties keep catalog order
//! 5. Keep the first `top_n` and map positions back to catalog entries

use crate::types::{RecommendError, Recommendation};
use data_loader::{DataStore, Position};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Stateless recommender over a shared, read-only [`DataStore`]
#[derive(Debug, Clone)]
pub struct Recommender {
    store: Arc<DataStore>,
}

impl Recommender {
    pub fn new(store: Arc<DataStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.store
    }

    /// Movies most similar to `title`, best first.
    ///
    /// An unknown title yields an empty list; use [`Recommender::try_recommend`]
    /// to tell "unknown" apart from "no neighbours".
    pub fn recommend(&self, title: &str, top_n: usize) -> Vec<Recommendation> {
        match self.try_recommend(title, top_n) {
            Ok(recommendations) => recommendations,
            Err(err) => {
                debug!("{}", err);
                Vec::new()
            }
        }
    }

    /// Like [`Recommender::recommend`], but reports an unknown title
    #[instrument(skip(self))]
    pub fn try_recommend(
        &self,
        title: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let position = self
            .store
            .position_of(title)
            .ok_or_else(|| RecommendError::NotFound {
                title: title.to_string(),
            })?;

        self.recommend_by_position(position, top_n)
    }

    /// Neighbours of the movie at `position`, best first, excluding itself
    pub fn recommend_by_position(
        &self,
        position: Position,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let row = self
            .store
            .similarity_row(position)
            .ok_or(RecommendError::OutOfRange {
                position,
                len: self.store.len(),
            })?;

        let neighbours = top_neighbours(row, position, top_n);

        let recommendations: Vec<Recommendation> = neighbours
            .into_iter()
            .filter_map(|(idx, score)| {
                let movie = self.store.movie(idx)?;
                Some(Recommendation::new(idx, movie, score))
            })
            .collect();

        debug!(
            "Found {} neighbours for position {} (requested {})",
            recommendations.len(),
            position,
            top_n
        );
        Ok(recommendations)
    }
}

/// Top `top_n` `(position, score)` pairs of `row`, skipping `exclude`.
///
/// `sort_by` is stable, so equal scores stay in position order.
/// `total_cmp` keeps the comparator total; NaN never reaches here because
/// the loader rejects it.
fn top_neighbours(row: &[f32], exclude: Position, top_n: usize) -> Vec<(Position, f32)> {
    if top_n == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(Position, f32)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|(idx, _)| *idx != exclude)
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_n);
    scored
}
