//! Nearest-neighbour lookups against a precomputed [`SimilarityMatrix`].
//!
//! ## Ordering
//! Neighbours are sorted by descending score with a stable sort over column
//! order, so equal scores come out in ascending movie id order. The query
//! movie itself is excluded by position rather than by dropping the first
//! sorted entry.

use crate::engine::SimilarityMatrix;
use data_loader::MovieId;
use tracing::{debug, instrument};

/// How many neighbours a recommendation shows
pub const DEFAULT_LIMIT: usize = 5;

/// A similar movie and how similar it is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub movie_id: MovieId,
    pub score: f32,
}

impl SimilarityMatrix {
    /// Up to `limit` movies most similar to `movie_id`, best first.
    ///
    /// Returns an empty list when the movie is not indexed or its rating
    /// vector is all zeros.
    #[instrument(skip(self))]
    pub fn most_similar(&self, movie_id: MovieId, limit: usize) -> Vec<Neighbor> {
        let Some(position) = self.position(movie_id) else {
            debug!("Movie is not in the similarity index");
            return Vec::new();
        };
        if self.is_degenerate(movie_id) {
            debug!("Movie has no non-zero ratings, nothing is similar to it");
            return Vec::new();
        }
        let Some(row) = self.row(movie_id) else {
            return Vec::new();
        };

        let mut neighbors: Vec<Neighbor> = self
            .items()
            .iter()
            .zip(row)
            .enumerate()
            .filter(|(j, _)| *j != position)
            .map(|(_, (&movie_id, &score))| Neighbor { movie_id, score })
            .collect();

        neighbors.sort_by(|a, b| b.score.total_cmp(&a.score));
        neighbors.truncate(limit);

        debug!("Found {} neighbors", neighbors.len());
        neighbors
    }
}

/// Top [`DEFAULT_LIMIT`] neighbours of `movie_id`
pub fn recommend(matrix: &SimilarityMatrix, movie_id: MovieId) -> Vec<Neighbor> {
    matrix.most_similar(movie_id, DEFAULT_LIMIT)
}
