//! Application context: the data a session works against.
//!
//! Built once by an explicit initialization step and shared read-only
//! afterwards. Nothing here is ever recomputed or invalidated.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use data_loader::DataIndex;
use similarity::{compute_similarity, SimilarityMatrix};

/// Loaded catalog plus the similarity matrix computed from its ratings
#[derive(Debug, Clone)]
pub struct AppContext {
    data_index: Arc<DataIndex>,
    similarity: Arc<SimilarityMatrix>,
}

impl AppContext {
    /// Load both files and compute the similarity matrix.
    ///
    /// Parsing and the matrix computation are CPU-bound, so they run on
    /// the blocking pool.
    pub async fn load(movies_path: PathBuf, ratings_path: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let data_index = DataIndex::load_from_paths(&movies_path, &ratings_path)
                .with_context(|| {
                    format!(
                        "Failed to load rating store from {} and {}",
                        movies_path.display(),
                        ratings_path.display()
                    )
                })?;
            let context = Self::build(data_index)?;
            info!("Application context ready in {:.2?}", start.elapsed());
            Ok(context)
        })
        .await
        .context("Initialization task panicked")?
    }

    /// Compute the similarity matrix for an already loaded index
    pub fn build(data_index: DataIndex) -> Result<Self> {
        let similarity = compute_similarity(data_index.ratings())
            .context("Failed to compute similarity matrix")?;
        Ok(Self::from_parts(Arc::new(data_index), Arc::new(similarity)))
    }

    /// Assemble a context from parts computed elsewhere
    pub fn from_parts(data_index: Arc<DataIndex>, similarity: Arc<SimilarityMatrix>) -> Self {
        Self {
            data_index,
            similarity,
        }
    }

    pub fn data_index(&self) -> &Arc<DataIndex> {
        &self.data_index
    }

    pub fn similarity(&self) -> &Arc<SimilarityMatrix> {
        &self.similarity
    }
}
