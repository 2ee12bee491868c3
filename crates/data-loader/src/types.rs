//! Core domain types for the movie catalog and similarity matrix.
//!
//! The catalog and the matrix share one coordinate system: the movie at
//! catalog position `i` owns row `i` and column `i` of the matrix.

use crate::error::{DataLoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Stable external identifier of a movie (the catalog service's id)
pub type MovieId = u32;

/// Offset shared by a movie's catalog entry and its matrix row/column
pub type Position = usize;

// =============================================================================
// Movie
// =============================================================================

/// A single catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "movie_id")]
    pub id: MovieId,
    pub title: String,
}

// =============================================================================
// Similarity Matrix
// =============================================================================

/// Square matrix of precomputed similarity scores, stored row-major.
///
/// `row(i)[j]` is the similarity of movie `i` to movie `j`. Symmetry is
/// expected but not enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build a matrix from parsed rows.
    ///
    /// Fails if the rows don't form a square, or if any score is NaN.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let size = rows.len();

        // Check every row before reserving size * size scores
        for (i, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(DataLoadError::DimensionMismatch {
                    what: format!("similarity row {}", i),
                    expected: size,
                    found: row.len(),
                });
            }
            if let Some(j) = row.iter().position(|s| s.is_nan()) {
                return Err(DataLoadError::InvalidValue {
                    field: format!("similarity[{}][{}]", i, j),
                    value: "NaN".to_string(),
                });
            }
        }

        let mut scores = Vec::with_capacity(size * size);
        for row in rows {
            scores.extend(row);
        }

        Ok(Self { size, scores })
    }

    /// Number of rows (and columns)
    pub fn size(&self) -> usize {
        self.size
    }

    /// Scores of one movie against every movie in the catalog
    pub fn row(&self, position: Position) -> Option<&[f32]> {
        if position >= self.size {
            return None;
        }
        let start = position * self.size;
        Some(&self.scores[start..start + self.size])
    }

    /// Single score lookup
    pub fn score(&self, from: Position, to: Position) -> Option<f32> {
        self.row(from)?.get(to).copied()
    }
}

// =============================================================================
// DataStore - The Core In-Memory Database
// =============================================================================

/// Owns the catalog and the matrix for the lifetime of the process.
///
/// Built once (see [`DataStore::load_from_files`] and
/// [`crate::StoreLoader`]) and shared read-only behind an `Arc`.
#[derive(Debug)]
pub struct DataStore {
    pub(crate) movies: Vec<Movie>,
    pub(crate) similarity: SimilarityMatrix,

    /// Title -> position of its first occurrence in the catalog
    pub(crate) title_index: HashMap<String, Position>,
}

impl DataStore {
    /// Assemble a store from already-parsed parts and validate it
    pub fn from_parts(movies: Vec<Movie>, similarity: SimilarityMatrix) -> Result<Self> {
        let mut store = Self {
            movies,
            similarity,
            title_index: HashMap::new(),
        };
        store.validate()?;
        store.build_title_index();
        Ok(store)
    }

    /// Number of movies in the catalog
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Catalog entry at a position
    pub fn movie(&self, position: Position) -> Option<&Movie> {
        self.movies.get(position)
    }

    /// The whole catalog, in matrix order
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// Similarity row for the movie at `position`
    pub fn similarity_row(&self, position: Position) -> Option<&[f32]> {
        self.similarity.row(position)
    }

    /// Position of the first movie whose title matches exactly
    pub fn position_of(&self, title: &str) -> Option<Position> {
        self.title_index.get(title).copied()
    }

    /// Case-insensitive substring search over titles.
    ///
    /// Exact (case-insensitive) matches come first; otherwise catalog order
    /// is preserved.
    pub fn search(&self, query: &str) -> Vec<(Position, &Movie)> {
        let query = query.to_lowercase();
        let mut matches: Vec<(bool, Position, &Movie)> = self
            .movies
            .iter()
            .enumerate()
            .filter_map(|(position, movie)| {
                let title = movie.title.to_lowercase();
                if title == query {
                    Some((true, position, movie))
                } else if title.contains(&query) {
                    Some((false, position, movie))
                } else {
                    None
                }
            })
            .collect();

        // stable: catalog order within each group
        matches.sort_by_key(|(exact, _, _)| !*exact);
        matches
            .into_iter()
            .map(|(_, position, movie)| (position, movie))
            .collect()
    }

    /// Get counts for debugging/validation: (movies, matrix size)
    pub fn counts(&self) -> (usize, usize) {
        (self.movies.len(), self.similarity.size())
    }
}
