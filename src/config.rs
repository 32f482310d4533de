//! Declarative configuration for [`SpectralClustering`].
//!
//! [`SpectralConfig`] is a plain data record. With the `serde` feature it can
//! be read from JSON or any other serde format:
//!
//! ```text
//! { "n_clusters": 3, "affinity_mode": "knn", "n_neighbors": 8, "random_seed": 7 }
//! ```
//!
//! [`SpectralClustering::from_config`] checks the record and turns it into a
//! builder.

use crate::cluster::SpectralClustering;
use crate::graph::AffinityMode;
use crate::spectral::RowNormalization;
use crate::{Error, Result};

/// Affinity construction named in a [`SpectralConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AffinityKind {
    /// Gaussian kernel.
    #[default]
    Rbf,
    /// k-nearest-neighbour connectivity.
    #[cfg_attr(feature = "serde", serde(alias = "nearest_neighbors"))]
    Knn,
    /// Input is already an affinity matrix.
    Precomputed,
}

/// Serializable spectral clustering settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpectralConfig {
    /// Number of clusters.
    pub n_clusters: usize,
    /// Affinity construction.
    pub affinity_mode: AffinityKind,
    /// RBF kernel coefficient; only valid with [`AffinityKind::Rbf`].
    pub gamma: Option<f64>,
    /// Neighbours per point; only valid with [`AffinityKind::Knn`].
    pub n_neighbors: Option<usize>,
    /// K-means restarts (default 10).
    pub n_init: Option<usize>,
    /// K-means iterations per restart (default 300).
    pub max_iter: Option<usize>,
    /// Base seed for k-means.
    pub random_seed: Option<u64>,
    /// Row post-processing of the embedding.
    pub row_normalization: Option<RowNormalization>,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            n_clusters: 2,
            affinity_mode: AffinityKind::default(),
            gamma: None,
            n_neighbors: None,
            n_init: None,
            max_iter: None,
            random_seed: None,
            row_normalization: None,
        }
    }
}

/// Neighbours used when a k-NN config leaves `n_neighbors` unset.
const DEFAULT_N_NEIGHBORS: usize = 10;

impl SpectralConfig {
    /// Check ranges and parameter/mode combinations.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidClusterCount`] when `n_clusters == 0`.
    /// - [`Error::InvalidParameter`] for a zero or non-finite value, or a
    ///   parameter that does not belong to the chosen affinity mode.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters == 0 {
            return Err(Error::InvalidClusterCount {
                requested: 0,
                n_items: 0,
            });
        }
        if self.n_init == Some(0) {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        if self.max_iter == Some(0) {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if let Some(gamma) = self.gamma {
            if self.affinity_mode != AffinityKind::Rbf {
                return Err(Error::InvalidParameter {
                    name: "gamma",
                    message: "only applies to the rbf affinity",
                });
            }
            if !(gamma.is_finite() && gamma > 0.0) {
                return Err(Error::InvalidParameter {
                    name: "gamma",
                    message: "must be a positive finite number",
                });
            }
        }
        if let Some(n_neighbors) = self.n_neighbors {
            if self.affinity_mode != AffinityKind::Knn {
                return Err(Error::InvalidParameter {
                    name: "n_neighbors",
                    message: "only applies to the knn affinity",
                });
            }
            if n_neighbors == 0 {
                return Err(Error::InvalidParameter {
                    name: "n_neighbors",
                    message: "must be at least 1",
                });
            }
        }
        Ok(())
    }

    /// The [`AffinityMode`] this config describes.
    pub fn affinity(&self) -> AffinityMode {
        match self.affinity_mode {
            AffinityKind::Rbf => AffinityMode::Rbf { gamma: self.gamma },
            AffinityKind::Knn => AffinityMode::Knn {
                n_neighbors: self.n_neighbors.unwrap_or(DEFAULT_N_NEIGHBORS),
            },
            AffinityKind::Precomputed => AffinityMode::Precomputed,
        }
    }
}

impl SpectralClustering {
    /// Build a validated clusterer from a [`SpectralConfig`].
    pub fn from_config(config: &SpectralConfig) -> Result<Self> {
        config.validate()?;
        let mut model = SpectralClustering::new(config.n_clusters).affinity(config.affinity());
        if let Some(n_init) = config.n_init {
            model = model.n_init(n_init);
        }
        if let Some(max_iter) = config.max_iter {
            model = model.max_iter(max_iter);
        }
        if let Some(seed) = config.random_seed {
            model = model.seed(seed);
        }
        if let Some(normalization) = config.row_normalization {
            model = model.row_normalization(normalization);
        }
        Ok(model)
    }
}
