//! Pivot a ratings table into a dense user-by-item matrix.
//!
//! Rows are users in ascending id order, columns are movies in ascending id
//! order. Cells nobody rated hold 0. When a user rated the same movie more
//! than once the cell holds the mean of those ratings.

use crate::error::{Result, SimilarityError};
use data_loader::{MovieId, Rating, UserId};
use std::collections::HashMap;
use tracing::debug;

/// Dense user-by-item rating matrix, stored row-major
#[derive(Debug, Clone)]
pub struct UserItemMatrix {
    users: Vec<UserId>,
    items: Vec<MovieId>,
    values: Vec<f32>,
}

impl UserItemMatrix {
    /// Build the matrix from rating rows.
    ///
    /// Fails on an empty table or a non-finite rating value.
    pub fn from_ratings(ratings: &[Rating]) -> Result<Self> {
        if ratings.is_empty() {
            return Err(SimilarityError::EmptyRatings);
        }
        if let Some(bad) = ratings.iter().find(|r| !r.rating.is_finite()) {
            return Err(SimilarityError::InvalidRating {
                user_id: bad.user_id,
                movie_id: bad.movie_id,
                value: bad.rating,
            });
        }

        let mut users: Vec<UserId> = ratings.iter().map(|r| r.user_id).collect();
        users.sort_unstable();
        users.dedup();
        let mut items: Vec<MovieId> = ratings.iter().map(|r| r.movie_id).collect();
        items.sort_unstable();
        items.dedup();

        let user_pos: HashMap<UserId, usize> =
            users.iter().enumerate().map(|(i, &u)| (u, i)).collect();
        let item_pos: HashMap<MovieId, usize> =
            items.iter().enumerate().map(|(i, &m)| (m, i)).collect();

        let cols = items.len();
        let mut sums = vec![0.0f64; users.len() * cols];
        let mut counts = vec![0u32; users.len() * cols];

        for rating in ratings {
            let cell = user_pos[&rating.user_id] * cols + item_pos[&rating.movie_id];
            sums[cell] += rating.rating as f64;
            counts[cell] += 1;
        }

        let values = sums
            .iter()
            .zip(&counts)
            .map(|(&sum, &count)| {
                if count == 0 {
                    0.0
                } else {
                    (sum / count as f64) as f32
                }
            })
            .collect();

        debug!(
            users = users.len(),
            items = items.len(),
            "Pivoted ratings into user-item matrix"
        );

        Ok(Self {
            users,
            items,
            values,
        })
    }

    /// (rows, columns)
    pub fn dims(&self) -> (usize, usize) {
        (self.users.len(), self.items.len())
    }

    /// Row labels
    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    /// Column labels
    pub fn items(&self) -> &[MovieId] {
        &self.items
    }

    /// Cell value, 0 for unknown users or movies
    pub fn get(&self, user_id: UserId, movie_id: MovieId) -> f32 {
        match (
            self.users.binary_search(&user_id),
            self.items.binary_search(&movie_id),
        ) {
            (Ok(row), Ok(col)) => self.values[row * self.items.len() + col],
            _ => 0.0,
        }
    }

    /// One user's ratings across every column
    pub fn row(&self, row: usize) -> &[f32] {
        let cols = self.items.len();
        &self.values[row * cols..(row + 1) * cols]
    }

    /// Column `col` as a full-length vector over users
    pub fn column(&self, col: usize) -> Vec<f32> {
        (0..self.users.len()).map(|row| self.row(row)[col]).collect()
    }
}
