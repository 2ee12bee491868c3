//! DataStore loading, validation and indexing.
//!
//! Loading runs in three steps:
//! 1. Parse the catalog and the matrix (in parallel)
//! 2. Validate that the two line up
//! 3. Build the title index used for lookups

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Catalog file names tried by [`DataStore::load_from_dir`], in order
pub const CATALOG_FILES: [&str; 2] = ["movies.json", "movies.dat"];

/// Matrix file names tried by [`DataStore::load_from_dir`], in order
pub const SIMILARITY_FILES: [&str; 2] = ["similarity.json", "similarity.dat"];

impl DataStore {
    /// Load the catalog and the similarity matrix from explicit paths
    pub fn load_from_files(catalog_path: &Path, similarity_path: &Path) -> Result<Self> {
        info!(
            catalog = %catalog_path.display(),
            similarity = %similarity_path.display(),
            "Loading movie data"
        );

        // The matrix dominates load time; parse both artifacts side by side
        let (movies, similarity) = rayon::join(
            || parser::parse_catalog(catalog_path),
            || parser::parse_similarity(similarity_path),
        );
        let movies = movies?;
        let similarity = similarity?;

        info!(
            "Loaded {} movies and a {}x{} similarity matrix",
            movies.len(),
            similarity.size(),
            similarity.size()
        );

        let store = Self::from_parts(movies, similarity)?;
        info!("DataStore successfully built and validated");
        Ok(store)
    }

    /// Load from a directory holding `movies.{json,dat}` and
    /// `similarity.{json,dat}`
    pub fn load_from_dir(data_dir: &Path) -> Result<Self> {
        let (catalog, similarity) = resolve_artifacts(data_dir)?;
        Self::load_from_files(&catalog, &similarity)
    }

    /// Validate data integrity
    ///
    /// Checks that the matrix has exactly one row and one column per
    /// catalog entry. Squareness and NaN-freedom are already guaranteed by
    /// [`SimilarityMatrix::from_rows`].
    pub fn validate(&self) -> Result<()> {
        if self.similarity.size() != self.movies.len() {
            return Err(DataLoadError::DimensionMismatch {
                what: "similarity matrix vs catalog".to_string(),
                expected: self.movies.len(),
                found: self.similarity.size(),
            });
        }
        Ok(())
    }

    /// Map each title to the position of its first occurrence
    pub(crate) fn build_title_index(&mut self) {
        self.title_index.clear();
        let mut duplicates = 0usize;

        for (position, movie) in self.movies.iter().enumerate() {
            match self.title_index.entry(movie.title.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(position);
                }
                Entry::Occupied(_) => duplicates += 1,
            }
        }

        if duplicates > 0 {
            warn!(
                duplicates,
                "Catalog contains duplicate titles; lookups use the first occurrence"
            );
        }
    }
}

/// Pick the first existing catalog and matrix file in `data_dir`
pub fn resolve_artifacts(data_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let find = |candidates: &[&str]| -> Result<PathBuf> {
        candidates
            .iter()
            .map(|name| data_dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| DataLoadError::FileNotFound {
                path: data_dir.join(candidates[0]).display().to_string(),
            })
    };

    Ok((find(&CATALOG_FILES[..])?, find(&SIMILARITY_FILES[..])?))
}

/// Load-once handle for a [`DataStore`].
///
/// The first successful [`StoreLoader::load`] parses the artifacts; later
/// calls hand back the same `Arc`. A failed load is not cached, so the next
/// call retries.
#[derive(Debug)]
pub struct StoreLoader {
    catalog_path: PathBuf,
    similarity_path: PathBuf,
    store: OnceLock<Arc<DataStore>>,
}

impl StoreLoader {
    pub fn new(catalog_path: impl Into<PathBuf>, similarity_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            similarity_path: similarity_path.into(),
            store: OnceLock::new(),
        }
    }

    /// Loader for the default artifact names inside `data_dir`
    pub fn from_dir(data_dir: &Path) -> Result<Self> {
        let (catalog, similarity) = resolve_artifacts(data_dir)?;
        Ok(Self::new(catalog, similarity))
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn similarity_path(&self) -> &Path {
        &self.similarity_path
    }

    /// Whether the store has already been loaded
    pub fn is_loaded(&self) -> bool {
        self.store.get().is_some()
    }

    /// Load the store on first use; return the cached one afterwards
    pub fn load(&self) -> Result<Arc<DataStore>> {
        if let Some(store) = self.store.get() {
            return Ok(Arc::clone(store));
        }

        let loaded = Arc::new(DataStore::load_from_files(
            &self.catalog_path,
            &self.similarity_path,
        )?);

        // If someone beat us to it, theirs wins and ours is dropped
        Ok(Arc::clone(self.store.get_or_init(|| loaded)))
    }
}
