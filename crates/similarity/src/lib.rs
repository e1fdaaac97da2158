//! # Similarity Crate
//!
//! Item-item collaborative filtering over a joined ratings table.
//!
//! ## Components
//!
//! ### Pivot
//! Turns rating rows into a dense user-by-item matrix, zero where nobody
//! rated, averaging duplicate (user, movie) ratings.
//!
//! ### Engine
//! Cosine similarity between every pair of item columns, computed once and
//! held as an immutable, symmetric [`SimilarityMatrix`] keyed by movie id.
//!
//! ### Query
//! "Movies rated like this one": the top [`DEFAULT_LIMIT`] neighbours of a
//! movie, excluding the movie itself.
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use similarity::{compute_similarity, recommend};
//!
//! let index = DataIndex::load_from_files("data/ml-latest-small".as_ref())?;
//! let matrix = compute_similarity(index.ratings())?;
//!
//! for neighbor in recommend(&matrix, 1) {
//!     println!("{} {:.3}", neighbor.movie_id, neighbor.score);
//! }
//! ```

pub mod error;
pub mod pivot;
pub mod engine;
pub mod query;

pub use engine::{compute_similarity, SimilarityMatrix};
pub use error::{Result, SimilarityError};
pub use pivot::UserItemMatrix;
pub use query::{recommend, Neighbor, DEFAULT_LIMIT};
