//! Engine crate for the similar-movie recommender.
//!
//! This crate contains the service that turns a picked title into
//! render-ready cards, plus the catalog-wide consistency check.

pub mod orchestrator;
pub mod check;

pub use orchestrator::{
    clamp_top_n, MovieCard, RecommendationService, DEFAULT_TOP_N, MAX_TOP_N, MIN_TOP_N,
};
pub use check::{run_check, CheckFailure, CheckReport};
