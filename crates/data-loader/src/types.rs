//! Core domain types for the movie catalog and ratings table.
//!
//! Everything downstream keys on the integer `MovieId`; titles are only
//! resolved when something is shown to a person.

use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user in the ratings table
pub type UserId = u32;

/// Unique identifier for a movie in the catalog
pub type MovieId = u32;

/// Lowest rating value accepted on load (MovieLens uses half-star steps)
pub const MIN_RATING: f32 = 0.5;

/// Highest rating value accepted on load
pub const MAX_RATING: f32 = 5.0;

// =============================================================================
// Movie-related Types
// =============================================================================

/// Represents a movie in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    /// Title with surrounding whitespace removed
    pub title: String,
    /// Year extracted from title (e.g., "Toy Story (1995)")
    pub year: Option<u16>,
    /// Empty when the catalog has no genre column or lists none
    pub genres: Vec<Genre>,
}

/// Movie genres used by the MovieLens catalogs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Children,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Fantasy,
    FilmNoir,
    Horror,
    Imax,
    Musical,
    Mystery,
    Romance,
    SciFi,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// Label as written in the catalog file
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Children => "Children",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Fantasy => "Fantasy",
            Genre::FilmNoir => "Film-Noir",
            Genre::Horror => "Horror",
            Genre::Imax => "IMAX",
            Genre::Musical => "Musical",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rating Type
// =============================================================================

/// A single rating from a user for a movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0
    pub rating: f32,
    /// Unix timestamp when rating was made, if the file carries one
    pub timestamp: Option<i64>,
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Precomputed statistics for a movie
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovieStats {
    pub avg_rating: f32,
    pub rating_count: u32,
}

// =============================================================================
// DataIndex - The joined, in-memory catalog and ratings table
// =============================================================================

/// Holds the catalog, the joined ratings table and the lookups built on top.
///
/// Built once by [`DataIndex::load_from_files`] (or
/// [`DataIndex::from_records`]) and read-only afterwards.
#[derive(Debug, Default)]
pub struct DataIndex {
    pub(crate) movies: HashMap<MovieId, Movie>,
    /// Trimmed title -> owning movie id
    pub(crate) title_index: HashMap<String, MovieId>,

    /// Ratings that survived the join, in file order
    pub(crate) ratings: Vec<Rating>,
    /// Joined ratings grouped per movie
    pub(crate) movie_ratings: HashMap<MovieId, Vec<Rating>>,

    pub(crate) movie_stats: HashMap<MovieId, MovieStats>,

    /// Ratings discarded because their movie id is not in the catalog
    pub(crate) dropped_ratings: usize,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Look a movie up by title, ignoring surrounding whitespace.
    ///
    /// When several catalog entries share a title the lowest id wins.
    pub fn find_by_title(&self, title: &str) -> Option<&Movie> {
        self.title_index
            .get(title.trim())
            .and_then(|id| self.movies.get(id))
    }

    /// The joined ratings table: every row references a catalog movie
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// Get all joined ratings for a movie
    pub fn get_movie_ratings(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get precomputed statistics for a movie
    pub fn get_movie_stats(&self, movie_id: MovieId) -> Option<&MovieStats> {
        self.movie_stats.get(&movie_id)
    }

    /// Movies sorted by title, one entry per distinct title.
    ///
    /// This is the list a person picks from before asking for recommendations.
    pub fn catalog(&self) -> Vec<&Movie> {
        let mut movies: Vec<&Movie> = self
            .title_index
            .values()
            .filter_map(|id| self.movies.get(id))
            .collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        movies
    }

    /// Case-insensitive substring search over titles.
    ///
    /// Exact matches come first, then higher average ratings.
    pub fn search_titles(&self, query: &str, limit: usize) -> Vec<&Movie> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(u8, f32, &Movie)> = self
            .movies
            .values()
            .filter_map(|movie| {
                let title = movie.title.to_lowercase();
                let rank = if title == needle {
                    0
                } else if title.contains(&needle) {
                    1
                } else {
                    return None;
                };
                let avg = self
                    .get_movie_stats(movie.id)
                    .map(|s| s.avg_rating)
                    .unwrap_or(0.0);
                Some((rank, avg, movie))
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        matches.truncate(limit);
        matches.into_iter().map(|(_, _, movie)| movie).collect()
    }

    /// Number of ratings dropped by the join
    pub fn dropped_ratings(&self) -> usize {
        self.dropped_ratings
    }

    /// Counts of (distinct users, movies, joined ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut users: Vec<UserId> = self.ratings.iter().map(|r| r.user_id).collect();
        users.sort_unstable();
        users.dedup();
        (users.len(), self.movies.len(), self.ratings.len())
    }
}
