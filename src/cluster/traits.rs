//! Clustering traits.

use crate::error::Result;
use ndarray::Array2;

/// Trait for clustering algorithms.
pub trait Clustering {
    /// Fit the model to data and return cluster assignments.
    ///
    /// `data` holds one point per row. Returns one cluster label per row.
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>>;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
