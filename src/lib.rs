//! # spectra
//!
//! Spectral clustering built from explicit, inspectable stages:
//!
//! ```text
//! points ─► affinity A ─► Laplacian L ─► k smallest eigenpairs ─► embedding ─► k-means ─► labels
//! ```
//!
//! - [`graph`]: RBF, k-NN and precomputed affinities, the symmetric normalized
//!   Laplacian, connected components.
//! - [`spectral`]: Jacobi eigensolver, smallest eigenpairs with an exact
//!   zero eigenspace for disconnected graphs, diffusion-map embedding.
//! - [`cluster`]: multi-restart k-means and the end-to-end
//!   [`SpectralClustering`] pipeline.
//! - [`metrics`]: ARI and NMI against ground truth; silhouette,
//!   Calinski-Harabasz and Davies-Bouldin from the data alone.
//!
//! Every intermediate artifact is returned in [`SpectralFit`]; nothing is
//! written to global state. Progress is reported through the `log` facade.
//!
//! **Default build** runs k-means restarts on rayon (`parallel`). The `serde`
//! feature makes [`SpectralConfig`] serializable.

pub mod cluster;
pub mod config;
/// Error types used across `spectra`.
pub mod error;
pub mod graph;
pub mod metrics;
pub mod spectral;


pub use error::{Error, Result, Warning};

pub use cluster::{Clustering, InitStrategy, Kmeans, KmeansFit, SpectralClustering, SpectralFit};
pub use config::{AffinityKind, SpectralConfig};
pub use graph::{AffinityMatrix, AffinityMode, NormalizedLaplacian};
pub use metrics::{ari, calinski_harabasz, davies_bouldin, nmi, silhouette_score};
pub use spectral::{EigenPairs, JacobiConfig, RowNormalization, ZeroSpaceBasis};
