//! DataIndex building: parse, validate, join and index.
//!
//! The join is an inner join on movie id. Ratings for movies that are not
//! in the catalog are dropped and counted, everything else that looks wrong
//! aborts the load.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Default catalog file name inside a data directory
pub const MOVIES_FILE: &str = "movies.csv";

/// Default ratings file name inside a data directory
pub const RATINGS_FILE: &str = "ratings.csv";

impl DataIndex {
    /// Load `movies.csv` and `ratings.csv` from a directory
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        Self::load_from_paths(&data_dir.join(MOVIES_FILE), &data_dir.join(RATINGS_FILE))
    }

    /// Load the catalog and ratings from explicit paths.
    ///
    /// Both files are parsed in parallel, then joined and indexed.
    pub fn load_from_paths(movies_path: &Path, ratings_path: &Path) -> Result<Self> {
        info!(
            movies = %movies_path.display(),
            ratings = %ratings_path.display(),
            "Loading rating store"
        );

        let (movies, ratings) = rayon::join(
            || parser::parse_movies(movies_path),
            || parser::parse_ratings(ratings_path),
        );
        let movies = movies?;
        let ratings = ratings?;

        info!(
            "Parsed {} movies and {} ratings",
            movies.len(),
            ratings.len()
        );

        Self::from_records(movies, ratings)
    }

    /// Build an index from already parsed records.
    ///
    /// Steps:
    /// 1. Insert the catalog with trimmed titles (duplicate movie ids are rejected)
    /// 2. Inner-join ratings to the catalog
    /// 3. Validate the joined rating values
    /// 4. Build the title index and per-movie statistics
    pub fn from_records(movies: Vec<Movie>, ratings: Vec<Rating>) -> Result<Self> {
        let mut index = DataIndex::new();

        for movie in movies {
            index.insert_movie(movie)?;
        }

        index.join_ratings(ratings)?;
        validate_ratings(&index.ratings)?;
        index.build_title_index();
        index.compute_movie_stats();

        let (users, movies, ratings) = index.counts();
        info!(
            users,
            movies,
            ratings,
            dropped = index.dropped_ratings,
            "Rating store ready"
        );
        Ok(index)
    }

    fn insert_movie(&mut self, mut movie: Movie) -> Result<()> {
        let trimmed = movie.title.trim();
        if trimmed.is_empty() {
            return Err(DataLoadError::InvalidValue {
                field: "title".to_string(),
                value: format!("empty title for movieId {}", movie.id),
            });
        }
        if trimmed.len() != movie.title.len() {
            movie.title = trimmed.to_string();
        }

        if self.movies.contains_key(&movie.id) {
            return Err(DataLoadError::ValidationError(format!(
                "duplicate movieId {} in catalog",
                movie.id
            )));
        }
        self.movies.insert(movie.id, movie);
        Ok(())
    }

    /// Keep only ratings whose movie is in the catalog
    fn join_ratings(&mut self, ratings: Vec<Rating>) -> Result<()> {
        let total = ratings.len();

        for rating in ratings {
            if !self.movies.contains_key(&rating.movie_id) {
                self.dropped_ratings += 1;
                continue;
            }
            self.movie_ratings
                .entry(rating.movie_id)
                .or_default()
                .push(rating);
            self.ratings.push(rating);
        }

        if self.dropped_ratings > 0 {
            warn!(
                dropped = self.dropped_ratings,
                "Dropped ratings that reference movies missing from the catalog"
            );
        }

        if self.ratings.is_empty() {
            return Err(DataLoadError::EmptyJoin {
                movies: self.movies.len(),
                ratings: total,
            });
        }
        Ok(())
    }

    /// Map each trimmed title to the lowest movie id carrying it
    fn build_title_index(&mut self) {
        let mut collisions = 0usize;

        for movie in self.movies.values() {
            match self.title_index.get_mut(&movie.title) {
                Some(owner) => {
                    collisions += 1;
                    if movie.id < *owner {
                        *owner = movie.id;
                    }
                }
                None => {
                    self.title_index.insert(movie.title.clone(), movie.id);
                }
            }
        }

        if collisions > 0 {
            warn!(
                collisions,
                "Catalog has duplicate titles, lookups resolve to the lowest movie id"
            );
        }
    }

    /// Compute average rating and rating count for every rated movie
    fn compute_movie_stats(&mut self) {
        self.movie_stats = self
            .movie_ratings
            .par_iter()
            .map(|(&movie_id, ratings)| {
                let rating_count = ratings.len() as u32;
                let total: f32 = ratings.iter().map(|r| r.rating).sum();
                (
                    movie_id,
                    MovieStats {
                        avg_rating: total / rating_count as f32,
                        rating_count,
                    },
                )
            })
            .collect();
    }
}

/// Reject joined ratings outside the accepted range.
///
/// Orphan rows are already gone, so they neither fail the load nor count
/// as duplicates. Duplicate (user, movie) pairs are allowed here and
/// averaged by the pivot.
fn validate_ratings(ratings: &[Rating]) -> Result<()> {
    let mut seen: HashMap<(UserId, MovieId), u32> = HashMap::with_capacity(ratings.len());

    for rating in ratings {
        if !rating.rating.is_finite() || rating.rating < MIN_RATING || rating.rating > MAX_RATING {
            return Err(DataLoadError::InvalidValue {
                field: "rating".to_string(),
                value: format!(
                    "{} (user {}, movie {})",
                    rating.rating, rating.user_id, rating.movie_id
                ),
            });
        }
        *seen.entry((rating.user_id, rating.movie_id)).or_insert(0) += 1;
    }

    let duplicates = seen.values().filter(|&&count| count > 1).count();
    if duplicates > 0 {
        warn!(
            duplicates,
            "Some users rated the same movie more than once, their ratings will be averaged"
        );
    }
    Ok(())
}
