//! # Recommender Crate
//!
//! Nearest-neighbour lookup over a precomputed similarity matrix:
//! "movies like the one you picked".
//!
//! The recommender holds no state of its own. It borrows the catalog and
//! matrix from a shared [`data_loader::DataStore`] on every call, so one
//! instance can be cloned freely.
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataStore;
//! use recommender::Recommender;
//! use std::sync::Arc;
//!
//! let store = Arc::new(DataStore::load_from_dir(Path::new("data"))?);
//! let recommender = Recommender::new(store);
//!
//! for rec in recommender.recommend("Avatar", 5) {
//!     println!("{} ({:.3})", rec.title, rec.score);
//! }
//! ```

pub mod types;
pub mod similar;

pub use types::{RecommendError, Recommendation};
pub use similar::Recommender;
