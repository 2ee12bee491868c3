//! # Recommendation Service
//!
//! One user action maps to one call of
//! [`RecommendationService::get_recommendations`]:
//! 1. Look up the similar movies
//! 2. Optionally resolve a poster for each, one at a time
//! 3. Return render-ready cards
//!
//! Poster failures never fail the request; the card just has no image.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use data_loader::{DataStore, MovieId};
use poster_client::PosterLookup;
use recommender::{Recommendation, Recommender};

/// Smallest number of recommendations a user can ask for
pub const MIN_TOP_N: usize = 1;
/// Largest number of recommendations a user can ask for
pub const MAX_TOP_N: usize = 10;
pub const DEFAULT_TOP_N: usize = 5;

/// A recommendation ready to render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub movie_id: MovieId,
    pub title: String,
    pub score: f32,
    pub poster_url: Option<String>,
}

impl From<Recommendation> for MovieCard {
    fn from(rec: Recommendation) -> Self {
        Self {
            movie_id: rec.movie_id,
            title: rec.title,
            score: rec.score,
            poster_url: None,
        }
    }
}

/// Wires the recommender to the poster lookup
#[derive(Clone)]
pub struct RecommendationService {
    recommender: Recommender,
    posters: Arc<dyn PosterLookup>,
}

impl RecommendationService {
    /// # Arguments
    /// * `data_store` - Shared, already-loaded catalog and matrix
    /// * `posters` - Poster lookup (an HTTP resolver, or `NoPosters`)
    pub fn new(data_store: Arc<DataStore>, posters: Arc<dyn PosterLookup>) -> Self {
        Self {
            recommender: Recommender::new(data_store),
            posters,
        }
    }

    pub fn data_store(&self) -> &Arc<DataStore> {
        self.recommender.store()
    }

    pub fn recommender(&self) -> &Recommender {
        &self.recommender
    }

    /// Cards for the movies most similar to `title`, best first.
    ///
    /// `top_n` is clamped to `MIN_TOP_N..=MAX_TOP_N`. An unknown title gives
    /// an empty list.
    pub async fn get_recommendations(
        &self,
        title: &str,
        top_n: usize,
        show_posters: bool,
    ) -> Vec<MovieCard> {
        let start_time = Instant::now();
        let top_n = clamp_top_n(top_n);

        let recommendations = self.recommender.recommend(title, top_n);
        info!(
            "Found {} recommendations for {:?} (top_n: {})",
            recommendations.len(),
            title,
            top_n
        );

        let mut cards: Vec<MovieCard> = recommendations.into_iter().map(MovieCard::from).collect();

        if show_posters {
            self.attach_posters(&mut cards).await;
        }

        info!(
            "Total time to get recommendations for {:?}: {:.2?}",
            title,
            start_time.elapsed()
        );
        cards
    }

    /// Resolve posters sequentially; no retries
    async fn attach_posters(&self, cards: &mut [MovieCard]) {
        let start_time = Instant::now();

        for card in cards.iter_mut() {
            card.poster_url = self.posters.resolve(card.movie_id).await;
        }

        let resolved = cards.iter().filter(|c| c.poster_url.is_some()).count();
        debug!(
            "Resolved {}/{} posters in {:.2?}",
            resolved,
            cards.len(),
            start_time.elapsed()
        );
    }
}

/// Clamp a requested count to the supported range
pub fn clamp_top_n(top_n: usize) -> usize {
    top_n.clamp(MIN_TOP_N, MAX_TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use data_loader::{Movie, SimilarityMatrix};
    use poster_client::NoPosters;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    fn build_test_data_store() -> Arc<DataStore> {
        let titles = [
            (19995, "Avatar"),
            (285, "Pirates of the Caribbean: At World's End"),
            (206647, "Spectre"),
            (49026, "The Dark Knight Rises"),
            (49529, "John Carter"),
        ];
        let movies = titles
            .iter()
            .map(|&(id, title)| Movie {
                id,
                title: title.to_string(),
            })
            .collect();

        let similarity = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.3, 0.1, 0.2, 0.6],
            vec![0.3, 1.0, 0.4, 0.2, 0.1],
            vec![0.1, 0.4, 1.0, 0.5, 0.0],
            vec![0.2, 0.2, 0.5, 1.0, 0.1],
            vec![0.6, 0.1, 0.0, 0.1, 1.0],
        ])
        .unwrap();

        Arc::new(DataStore::from_parts(movies, similarity).unwrap())
    }

    /// Poster lookup that only knows odd ids and counts its calls
    #[derive(Default)]
    struct FakePosters {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PosterLookup for FakePosters {
        async fn resolve(&self, movie_id: MovieId) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (movie_id % 2 == 1).then(|| format!("https://img.test/{}.jpg", movie_id))
        }
    }

    fn build_service() -> (RecommendationService, Arc<FakePosters>) {
        let posters = Arc::new(FakePosters::default());
        let service = RecommendationService::new(build_test_data_store(), posters.clone());
        (service, posters)
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test]
    async fn test_cards_in_similarity_order() {
        let (service, _) = build_service();

        let cards = service.get_recommendations("Avatar", 3, false).await;
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();

        assert_eq!(
            titles,
            vec!["John Carter", "Pirates of the Caribbean: At World's End", "The Dark Knight Rises"]
        );
        assert_eq!(cards[0].score, 0.6);
    }

    #[tokio::test]
    async fn test_posters_attached_when_requested() {
        let (service, posters) = build_service();

        let cards = service.get_recommendations("Avatar", 2, true).await;

        // 49529 is odd, 285 is odd
        assert_eq!(cards[0].poster_url.as_deref(), Some("https://img.test/49529.jpg"));
        assert_eq!(cards[1].poster_url.as_deref(), Some("https://img.test/285.jpg"));
        assert_eq!(posters.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_poster_leaves_card_without_image() {
        let (service, _) = build_service();

        let cards = service.get_recommendations("Spectre", 1, true).await;

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "The Dark Knight Rises");
        assert_eq!(cards[0].poster_url, None);
    }

    #[tokio::test]
    async fn test_posters_skipped_when_hidden() {
        let (service, posters) = build_service();

        let cards = service.get_recommendations("Avatar", 4, false).await;

        assert_eq!(cards.len(), 4);
        assert!(cards.iter().all(|c| c.poster_url.is_none()));
        assert_eq!(posters.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_title_is_empty() {
        let (service, posters) = build_service();

        assert!(service.get_recommendations("Unknown Title", 5, true).await.is_empty());
        assert_eq!(posters.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_top_n_is_clamped() {
        let service = RecommendationService::new(build_test_data_store(), Arc::new(NoPosters));

        assert_eq!(service.get_recommendations("Avatar", 0, false).await.len(), 1);
        assert_eq!(service.get_recommendations("Avatar", 50, false).await.len(), 4);
    }

    #[test]
    fn test_clamp_top_n() {
        assert_eq!(clamp_top_n(0), MIN_TOP_N);
        assert_eq!(clamp_top_n(7), 7);
        assert_eq!(clamp_top_n(11), MAX_TOP_N);
    }
}
