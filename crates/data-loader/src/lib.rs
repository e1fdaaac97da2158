//! # Data Loader Crate
//!
//! Loads a movie catalog and a user ratings table and joins them on the
//! movie identifier.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, Rating, DataIndex)
//! - **parser**: Parse the CSV files into Rust structs
//! - **index**: Validate, join and index the parsed records
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data/ml-latest-small"))?;
//!
//! let movie = index.find_by_title("Toy Story (1995)").unwrap();
//! let ratings = index.get_movie_ratings(movie.id);
//!
//! println!("{} has {} ratings", movie.title, ratings.len());
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use index::{MOVIES_FILE, RATINGS_FILE};
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    // Core types
    Movie,
    Rating,
    DataIndex,
    MovieStats,
    // Enums
    Genre,
    // Limits
    MIN_RATING,
    MAX_RATING,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_index_creation() {
        let index = DataIndex::new();
        let (users, movies, ratings) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(movies, 0);
        assert_eq!(ratings, 0);
    }

    #[test]
    fn test_from_records() {
        let index = DataIndex::from_records(
            vec![Movie {
                id: 1,
                title: "Toy Story (1995)".to_string(),
                year: Some(1995),
                genres: vec![Genre::Animation, Genre::Children, Genre::Comedy],
            }],
            vec![Rating {
                user_id: 1,
                movie_id: 1,
                rating: 5.0,
                timestamp: Some(978300760),
            }],
        )
        .unwrap();

        let retrieved = index.get_movie(1).unwrap();
        assert_eq!(retrieved.year, Some(1995));
        assert_eq!(retrieved.genres.len(), 3);
        assert_eq!(index.get_movie_ratings(1)[0].rating, 5.0);
    }

    #[test]
    fn test_empty_queries() {
        let index = DataIndex::new();

        assert!(index.get_movie(999).is_none());
        assert!(index.find_by_title("Nothing").is_none());
        assert!(index.get_movie_ratings(999).is_empty());
        assert!(index.get_movie_stats(999).is_none());
        assert!(index.catalog().is_empty());
    }

    #[test]
    fn test_genre_display_matches_catalog_label() {
        assert_eq!(Genre::SciFi.to_string(), "Sci-Fi");
        assert_eq!(Genre::FilmNoir.to_string(), "Film-Noir");
    }
}
