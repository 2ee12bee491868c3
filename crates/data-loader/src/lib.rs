//! # Data Loader Crate
//!
//! Loads the movie catalog and its precomputed similarity matrix, checks
//! that they line up, and keeps them resident for the life of the process.
//!
//! ## Main Components
//!
//! - **types**: `Movie`, `SimilarityMatrix`, `DataStore`
//! - **parser**: JSON and `.dat` artifact parsers
//! - **index**: loading, validation, title index, load-once `StoreLoader`
//! - **error**: `DataLoadError`
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::StoreLoader;
//! use std::path::Path;
//!
//! let loader = StoreLoader::from_dir(Path::new("data"))?;
//! let store = loader.load()?;
//!
//! let position = store.position_of("Avatar").unwrap();
//! let row = store.similarity_row(position).unwrap();
//! println!("{} has {} neighbours", store.movie(position).unwrap().title, row.len() - 1);
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use index::{resolve_artifacts, StoreLoader, CATALOG_FILES, SIMILARITY_FILES};
pub use types::{
    // Type aliases
    MovieId,
    Position,
    // Core types
    Movie,
    SimilarityMatrix,
    DataStore,
};
