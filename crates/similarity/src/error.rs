use data_loader::{MovieId, UserId};
use thiserror::Error;

/// Errors that prevent a similarity matrix from being built
#[derive(Error, Debug, PartialEq)]
pub enum SimilarityError {
    #[error("No ratings to build a user-item matrix from")]
    EmptyRatings,

    #[error("Rating {value} from user {user_id} for movie {movie_id} is not a finite number")]
    InvalidRating {
        user_id: UserId,
        movie_id: MovieId,
        value: f32,
    },
}

pub type Result<T> = std::result::Result<T, SimilarityError>;
