//! Item-item cosine similarity.
//!
//! Each column of the user-item matrix is an item vector. Vectors are
//! L2-normalised once, their non-zero cells extracted, and every pair is
//! scored with a sparse dot product. Rows of the output are filled in
//! parallel with Rayon.
//!
//! A column with no non-zero cell has no direction, so its similarity to
//! every item, itself included, is 0.

use crate::error::Result;
use crate::pivot::UserItemMatrix;
use data_loader::{MovieId, Rating};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, instrument};

/// Square, symmetric item-item similarity table keyed by movie id
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    items: Vec<MovieId>,
    positions: HashMap<MovieId, usize>,
    /// Row-major `items.len() x items.len()`
    values: Vec<f32>,
    degenerate: Vec<bool>,
}

/// Non-zero cells of a normalised item vector, ordered by row
struct ItemVector {
    entries: Vec<(u32, f32)>,
}

impl ItemVector {
    fn from_column(column: &[f32]) -> Self {
        let norm = column.iter().map(|&v| v as f64 * v as f64).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Self {
                entries: Vec::new(),
            };
        }
        let entries = column
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(row, &v)| (row as u32, (v as f64 / norm) as f32))
            .collect();
        Self { entries }
    }

    fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge-join dot product. Both operands are walked in row order, so
    /// `a.dot(b)` and `b.dot(a)` add the same products in the same order.
    fn dot(&self, other: &ItemVector) -> f32 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f64;
        while i < self.entries.len() && j < other.entries.len() {
            let (ra, va) = self.entries[i];
            let (rb, vb) = other.entries[j];
            if ra == rb {
                sum += va as f64 * vb as f64;
                i += 1;
                j += 1;
            } else if ra < rb {
                i += 1;
            } else {
                j += 1;
            }
        }
        sum as f32
    }
}

/// Pivot the ratings and compute the full item-item similarity matrix
pub fn compute_similarity(ratings: &[Rating]) -> Result<SimilarityMatrix> {
    let matrix = UserItemMatrix::from_ratings(ratings)?;
    Ok(SimilarityMatrix::from_user_item(&matrix))
}

impl SimilarityMatrix {
    /// Cosine similarity between every pair of columns of `matrix`
    #[instrument(skip(matrix), fields(users = matrix.dims().0, items = matrix.dims().1))]
    pub fn from_user_item(matrix: &UserItemMatrix) -> Self {
        let start = Instant::now();
        let (_, n) = matrix.dims();

        let vectors: Vec<ItemVector> = (0..n)
            .into_par_iter()
            .map(|col| ItemVector::from_column(&matrix.column(col)))
            .collect();

        let mut values = vec![0.0f32; n * n];
        values.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
            let a = &vectors[i];
            if a.is_zero() {
                return;
            }
            for (j, cell) in row.iter_mut().enumerate() {
                let b = &vectors[j];
                *cell = if i == j {
                    1.0
                } else if b.is_zero() {
                    0.0
                } else {
                    a.dot(b).clamp(-1.0, 1.0)
                };
            }
        });

        let items = matrix.items().to_vec();
        let positions = items.iter().enumerate().map(|(i, &m)| (m, i)).collect();
        let degenerate: Vec<bool> = vectors.iter().map(ItemVector::is_zero).collect();

        info!(
            items = n,
            degenerate = degenerate.iter().filter(|&&d| d).count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Computed item-item similarity"
        );

        Self {
            items,
            positions,
            values,
            degenerate,
        }
    }

    /// Number of items on each axis
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Movie ids in column order (ascending)
    pub fn items(&self) -> &[MovieId] {
        &self.items
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.positions.contains_key(&movie_id)
    }

    pub(crate) fn position(&self, movie_id: MovieId) -> Option<usize> {
        self.positions.get(&movie_id).copied()
    }

    /// Similarity between two movies, `None` if either is not indexed
    pub fn score(&self, a: MovieId, b: MovieId) -> Option<f32> {
        let i = self.position(a)?;
        let j = self.position(b)?;
        Some(self.values[i * self.len() + j])
    }

    /// One movie's similarities, aligned with [`SimilarityMatrix::items`]
    pub fn row(&self, movie_id: MovieId) -> Option<&[f32]> {
        let i = self.position(movie_id)?;
        let n = self.len();
        Some(&self.values[i * n..(i + 1) * n])
    }

    /// True when the movie's rating vector is all zeros
    pub fn is_degenerate(&self, movie_id: MovieId) -> bool {
        self.position(movie_id)
            .map(|i| self.degenerate[i])
            .unwrap_or(false)
    }
}
