//! Clustering algorithms.
//!
//! ## K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! **Assumptions**:
//! - Clusters are roughly spherical
//! - Clusters have similar sizes
//! - You know k in advance
//!
//! ## Spectral clustering
//!
//! Runs k-means not on the raw points but on their coordinates in the
//! eigenvectors of the graph Laplacian. Clusters only need to be connected
//! in the affinity graph, not convex in feature space.
//!
//! ## Usage
//!
//! ```rust
//! use spectra::cluster::{Clustering, Kmeans, SpectralClustering};
//! use ndarray::array;
//!
//! let data = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
//!
//! let labels = Kmeans::new(2).with_seed(1).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//!
//! let labels = SpectralClustering::new(2).n_neighbors(1).seed(1).fit_predict(&data).unwrap();
//! assert_ne!(labels[0], labels[2]);
//! ```

mod kmeans;
mod spectral;
mod traits;

pub use kmeans::{InitStrategy, Kmeans, KmeansFit};
pub use spectral::{SpectralClustering, SpectralFit};
pub use traits::Clustering;
