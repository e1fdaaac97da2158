//! # Recommendation Orchestrator
//!
//! Turns a selected movie into the result slots a person sees:
//! 1. Resolve the title against the catalog
//! 2. Look up its nearest neighbours in the similarity matrix
//! 3. Resolve neighbour ids back to catalog movies
//! 4. Fetch a poster for each slot, one at a time, in rank order
//!
//! Missing titles and empty neighbour lists are outcomes, not errors. A
//! failed poster only affects its own slot.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument, warn};

use data_loader::{Movie, MovieId};
use posters::{Poster, PosterFetcher};
use similarity::{DEFAULT_LIMIT, Neighbor};

use crate::context::AppContext;

/// One result slot
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRecommendation {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub year: Option<u16>,
    pub score: f32,
    pub poster: Poster,
}

/// What a recommendation request produced
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationOutcome {
    /// The title is not in the catalog or has no ratings to compare
    NotFound { query: String },
    /// The movie is indexed but nothing can be ranked against it
    NoRecommendations { movie: Movie },
    /// Ranked result slots, best first
    Recommendations {
        movie: Movie,
        items: Vec<MovieRecommendation>,
    },
}

/// Coordinates catalog lookup, similarity query and poster fetching
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    context: AppContext,
    posters: Arc<dyn PosterFetcher>,
    limit: usize,
}

impl RecommendationOrchestrator {
    pub fn new(context: AppContext, posters: Arc<dyn PosterFetcher>) -> Self {
        Self {
            context,
            posters,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Configure how many slots to fill (default: 5)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Recommend movies similar to the catalog entry titled `title`
    #[instrument(skip(self))]
    pub async fn recommend_title(&self, title: &str) -> RecommendationOutcome {
        match self.context.data_index().find_by_title(title) {
            Some(movie) => self.recommend_movie(movie.id).await,
            None => {
                warn!("Title not found in catalog");
                RecommendationOutcome::NotFound {
                    query: title.trim().to_string(),
                }
            }
        }
    }

    /// Recommend movies similar to the movie with id `movie_id`
    pub async fn recommend_movie(&self, movie_id: MovieId) -> RecommendationOutcome {
        let start = Instant::now();
        let data_index = self.context.data_index();

        let Some(movie) = data_index.get_movie(movie_id) else {
            warn!(movie_id, "Movie id not found in catalog");
            return RecommendationOutcome::NotFound {
                query: movie_id.to_string(),
            };
        };

        if !self.context.similarity().contains(movie_id) {
            warn!(movie_id, title = %movie.title, "Movie has no ratings in the similarity index");
            return RecommendationOutcome::NotFound {
                query: movie.title.clone(),
            };
        }

        let neighbors = self.similar_movies(movie_id);
        if neighbors.is_empty() {
            warn!(movie_id, title = %movie.title, "No similar movies");
            return RecommendationOutcome::NoRecommendations {
                movie: movie.clone(),
            };
        }

        let items = self.attach_posters(neighbors).await;
        info!(
            movie_id,
            results = items.len(),
            placeholders = items.iter().filter(|i| i.poster.is_placeholder()).count(),
            "Recommendations ready in {:.2?}",
            start.elapsed()
        );

        RecommendationOutcome::Recommendations {
            movie: movie.clone(),
            items,
        }
    }

    /// Nearest neighbours only, without catalog or poster lookups
    pub fn similar_movies(&self, movie_id: MovieId) -> Vec<Neighbor> {
        self.context.similarity().most_similar(movie_id, self.limit)
    }

    /// Resolve neighbours to catalog movies and fetch posters sequentially
    async fn attach_posters(&self, neighbors: Vec<Neighbor>) -> Vec<MovieRecommendation> {
        let mut items = Vec::with_capacity(neighbors.len());

        for neighbor in neighbors {
            let Some(movie) = self.context.data_index().get_movie(neighbor.movie_id) else {
                warn!(movie_id = neighbor.movie_id, "Neighbor missing from catalog, skipping");
                continue;
            };

            let poster = self.posters.fetch_poster_url(&movie.title).await;
            items.push(MovieRecommendation {
                movie_id: movie.id,
                title: movie.title.clone(),
                genres: movie.genres.iter().map(|g| g.to_string()).collect(),
                year: movie.year,
                score: neighbor.score,
                poster,
            });
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use data_loader::{DataIndex, Genre, Rating, UserId};
    use mockall::{mock, Sequence};
    use posters::PlaceholderPosters;
    use similarity::{compute_similarity, recommend};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    mock! {
        pub Posters {}

        #[async_trait]
        impl PosterFetcher for Posters {
            async fn fetch_poster_url(&self, title: &str) -> Poster;
            fn name(&self) -> &'static str;
        }
    }

    /// Fails for one title, succeeds for the rest
    struct FlakyPosters {
        failing_title: String,
    }

    #[async_trait]
    impl PosterFetcher for FlakyPosters {
        async fn fetch_poster_url(&self, title: &str) -> Poster {
            if title == self.failing_title {
                Poster::Placeholder("http://img/placeholder.png".to_string())
            } else {
                Poster::Image(format!("http://img/{}.jpg", title))
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            year: Some(1990 + id as u16),
            genres: vec![Genre::Drama],
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: None,
        }
    }

    /// Seven rated movies ("Movie 1".."Movie 7") and one unrated one
    fn build_test_index() -> DataIndex {
        let mut movies: Vec<Movie> = (1..=7).map(|id| movie(id, &format!("Movie {}", id))).collect();
        movies.push(movie(8, "Never Rated"));

        let mut ratings = Vec::new();
        for movie_id in 1..=7u32 {
            for user_id in 1..=4u32 {
                let value = ((movie_id * user_id + movie_id) % 5 + 1) as f32;
                ratings.push(rating(user_id, movie_id, value));
            }
        }

        DataIndex::from_records(movies, ratings).unwrap()
    }

    fn build_test_context() -> AppContext {
        AppContext::build(build_test_index()).unwrap()
    }

    fn placeholder_orchestrator(context: AppContext) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(context, Arc::new(PlaceholderPosters::new("http://img/none.png")))
    }

    // ============================================================================
    // Outcomes
    // ============================================================================

    #[tokio::test]
    async fn test_unknown_title_is_not_found() {
        let orchestrator = placeholder_orchestrator(build_test_context());

        let outcome = orchestrator.recommend_title("  Not In Catalog ").await;

        assert_eq!(
            outcome,
            RecommendationOutcome::NotFound {
                query: "Not In Catalog".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unrated_catalog_movie_is_not_found() {
        let orchestrator = placeholder_orchestrator(build_test_context());

        let outcome = orchestrator.recommend_title("Never Rated").await;

        assert!(matches!(outcome, RecommendationOutcome::NotFound { .. }));
        assert!(matches!(
            orchestrator.recommend_movie(999).await,
            RecommendationOutcome::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_degenerate_movie_has_no_recommendations() {
        let index = Arc::new(
            DataIndex::from_records(
                vec![movie(1, "A"), movie(2, "B")],
                vec![rating(1, 1, 4.0), rating(1, 2, 3.0)],
            )
            .unwrap(),
        );
        // Movie 2's column is all zeros in this matrix
        let matrix = Arc::new(compute_similarity(&[rating(1, 1, 4.0), rating(1, 2, 0.0)]).unwrap());
        let orchestrator = placeholder_orchestrator(AppContext::from_parts(index, matrix));

        let outcome = orchestrator.recommend_title("B").await;

        assert_eq!(
            outcome,
            RecommendationOutcome::NoRecommendations { movie: movie(2, "B") }
        );
    }

    #[tokio::test]
    async fn test_recommendations_follow_similarity_order() {
        let context = build_test_context();
        let expected = recommend(context.similarity(), 1);
        assert_eq!(expected.len(), DEFAULT_LIMIT);

        let mut posters = MockPosters::new();
        let mut seq = Sequence::new();
        for neighbor in &expected {
            let title = format!("Movie {}", neighbor.movie_id);
            posters
                .expect_fetch_poster_url()
                .withf(move |t| t == title)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|t| Poster::Image(format!("http://img/{}.jpg", t)));
        }

        let orchestrator = RecommendationOrchestrator::new(context, Arc::new(posters));
        let outcome = orchestrator.recommend_title("Movie 1").await;

        let RecommendationOutcome::Recommendations { movie, items } = outcome else {
            panic!("expected recommendations, got {:?}", outcome);
        };
        assert_eq!(movie.id, 1);
        assert_eq!(items.len(), DEFAULT_LIMIT);
        for (item, neighbor) in items.iter().zip(&expected) {
            assert_eq!(item.movie_id, neighbor.movie_id);
            assert_eq!(item.score, neighbor.score);
            assert_eq!(item.genres, vec!["Drama".to_string()]);
            assert_eq!(item.poster.url(), format!("http://img/{}.jpg", item.title));
        }
        assert!(items.iter().all(|i| i.movie_id != 1));
        assert!(items.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_failed_poster_only_affects_its_slot() {
        let context = build_test_context();
        let first = recommend(context.similarity(), 3)[0];
        let failing_title = format!("Movie {}", first.movie_id);

        let orchestrator = RecommendationOrchestrator::new(
            context,
            Arc::new(FlakyPosters {
                failing_title: failing_title.clone(),
            }),
        );

        let RecommendationOutcome::Recommendations { items, .. } =
            orchestrator.recommend_movie(3).await
        else {
            panic!("expected recommendations");
        };

        assert_eq!(items.len(), DEFAULT_LIMIT);
        assert_eq!(items[0].title, failing_title);
        assert!(items[0].poster.is_placeholder());
        assert!(items[1..].iter().all(|i| !i.poster.is_placeholder()));
    }

    #[tokio::test]
    async fn test_limit_controls_slot_count() {
        let mut posters = MockPosters::new();
        posters
            .expect_fetch_poster_url()
            .times(2)
            .returning(|_| Poster::Placeholder("http://img/none.png".to_string()));

        let orchestrator =
            RecommendationOrchestrator::new(build_test_context(), Arc::new(posters)).with_limit(2);

        let RecommendationOutcome::Recommendations { items, .. } =
            orchestrator.recommend_title("Movie 4").await
        else {
            panic!("expected recommendations");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(orchestrator.similar_movies(4).len(), 2);
    }

    #[tokio::test]
    async fn test_not_found_never_fetches_posters() {
        let mut posters = MockPosters::new();
        posters.expect_fetch_poster_url().never();

        let orchestrator = RecommendationOrchestrator::new(build_test_context(), Arc::new(posters));

        assert!(matches!(
            orchestrator.recommend_title("Nope").await,
            RecommendationOutcome::NotFound { .. }
        ));
    }
}
