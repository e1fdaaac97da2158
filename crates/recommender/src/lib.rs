//! # Recommender Crate
//!
//! Ties the rating store, the similarity index and the poster service
//! together into one recommendation request.
//!
//! ```ignore
//! let context = AppContext::load(movies_path, ratings_path).await?;
//! let orchestrator = RecommendationOrchestrator::new(context, posters);
//!
//! match orchestrator.recommend_title("Toy Story (1995)").await {
//!     RecommendationOutcome::Recommendations { items, .. } => { /* render */ }
//!     RecommendationOutcome::NoRecommendations { .. } => { /* empty state */ }
//!     RecommendationOutcome::NotFound { .. } => { /* not found */ }
//! }
//! ```

pub mod context;
pub mod orchestrator;

pub use context::AppContext;
pub use orchestrator::{MovieRecommendation, RecommendationOrchestrator, RecommendationOutcome};
