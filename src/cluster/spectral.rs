//! Spectral clustering via graph Laplacian eigenvectors.
//!
//! Spectral clustering works by:
//! 1. Build similarity graph from points
//! 2. Compute normalized Laplacian
//! 3. Find k smallest eigenvectors
//! 4. Run k-means on the embedded points
//!
//! # When to Use Spectral Clustering
//!
//! Spectral clustering excels at finding non-convex clusters that k-means misses.
//! It's particularly good for:
//!
//! - Image segmentation (groups of similar pixels)
//! - Community detection in graphs
//! - Clusters with complex shapes
//!
//! # Trade-offs
//!
//! | Aspect | Spectral | K-means |
//! |--------|----------|---------|
//! | Shape | Any | Convex |
//! | Complexity | O(n³) eigendecomp | O(nkd × iter) |
//! | Memory | O(n²) similarity | O(nd) |
//! | Scalability | < 10k points | Millions |
//!
//! # Algorithm
//!
//! ```text
//! 1. Compute affinity matrix A (Gaussian kernel, kNN, or precomputed)
//! 2. Compute normalized Laplacian L_sym = I - D^{-1/2} A D^{-1/2}
//! 3. Find k smallest eigenpairs of L_sym (canonical basis if disconnected)
//! 4. Scale eigenvector i by sqrt(max(0, 1 - λᵢ)) (diffusion map)
//! 5. Optionally normalize rows to unit length
//! 6. Run k-means on the rows
//! ```
//!
//! # Example
//!
//! ```
//! use spectra::cluster::SpectralClustering;
//! use ndarray::array;
//!
//! let points = array![
//!     [0.0, 0.0], [0.1, 0.0], [0.0, 0.1],  // Cluster 1
//!     [5.0, 5.0], [5.1, 5.0], [5.0, 5.1],  // Cluster 2
//! ];
//!
//! let fit = SpectralClustering::new(2)
//!     .gamma(1.0)
//!     .seed(42)
//!     .fit(&points)?;
//! assert_eq!(fit.labels[0], fit.labels[2]);
//! assert_ne!(fit.labels[0], fit.labels[3]);
//! # Ok::<(), spectra::Error>(())
//! ```
//!
//! # References
//!
//! - Ng, Jordan, Weiss (2001). "On Spectral Clustering"
//! - von Luxburg (2007). "A Tutorial on Spectral Clustering"
//! - Coifman, Lafon (2006). "Diffusion maps"

use ndarray::Array2;

use super::kmeans::{InitStrategy, Kmeans};
use super::traits::Clustering;
use crate::error::Warning;
use crate::graph::{
    build_affinity, build_normalized_laplacian, AffinityMatrix, AffinityMode, Components,
    NormalizedLaplacian,
};
use crate::spectral::{
    build_embedding, EigenPairs, JacobiConfig, RowNormalization, SpectralDecomposer,
    ZeroSpaceBasis,
};
use crate::{Error, Result};

/// Spectral clustering configuration and runner.
///
/// Uses graph Laplacian eigenvectors to embed points, then k-means to cluster.
#[derive(Debug, Clone)]
pub struct SpectralClustering {
    /// Number of clusters
    k: usize,
    /// Affinity construction
    affinity: AffinityMode,
    /// K-means restarts
    n_init: usize,
    /// K-means iterations per restart
    max_iter: usize,
    /// K-means seeding
    init: InitStrategy,
    /// Base seed for k-means restarts
    seed: Option<u64>,
    row_normalization: RowNormalization,
    zero_space: ZeroSpaceBasis,
    jacobi: JacobiConfig,
}

/// Every artifact of one spectral clustering run.
#[derive(Debug, Clone)]
pub struct SpectralFit {
    /// Symmetric affinity matrix.
    pub affinity: AffinityMatrix,
    /// Normalized Laplacian with its degree vector.
    pub laplacian: NormalizedLaplacian,
    /// The `k` smallest eigenpairs.
    pub eigenpairs: EigenPairs,
    /// `n × k` embedding fed to k-means.
    pub embedding: Array2<f64>,
    /// Cluster of every point.
    pub labels: Vec<usize>,
    /// K-means inertia in embedding space.
    pub inertia: f64,
    /// Whether the winning k-means restart converged.
    pub converged: bool,
    /// Multiplicity of the zero eigenvalue.
    pub n_components: usize,
    /// Data-quality warnings met along the way.
    pub warnings: Vec<Warning>,
}

impl SpectralClustering {
    /// Create new spectral clustering with k clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            affinity: AffinityMode::default(),
            n_init: 10,
            max_iter: 300,
            init: InitStrategy::default(),
            seed: None,
            row_normalization: RowNormalization::default(),
            zero_space: ZeroSpaceBasis::default(),
            jacobi: JacobiConfig::default(),
        }
    }

    /// Set affinity construction.
    pub fn affinity(mut self, affinity: AffinityMode) -> Self {
        self.affinity = affinity;
        self
    }

    /// RBF affinity with kernel coefficient `gamma`.
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.affinity = AffinityMode::Rbf { gamma: Some(gamma) };
        self
    }

    /// k-NN affinity with `n` neighbours per point.
    pub fn n_neighbors(mut self, n: usize) -> Self {
        self.affinity = AffinityMode::Knn { n_neighbors: n };
        self
    }

    /// Set number of k-means restarts.
    pub fn n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set number of k-means iterations.
    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set k-means initialization.
    pub fn init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set the base random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set row post-processing of the embedding.
    pub fn row_normalization(mut self, normalization: RowNormalization) -> Self {
        self.row_normalization = normalization;
        self
    }

    /// Set the zero-eigenspace basis used for disconnected graphs.
    pub fn zero_space_basis(mut self, basis: ZeroSpaceBasis) -> Self {
        self.zero_space = basis;
        self
    }

    /// Set the eigensolver budget.
    pub fn jacobi(mut self, jacobi: JacobiConfig) -> Self {
        self.jacobi = jacobi;
        self
    }

    /// Fit spectral clustering to points.
    ///
    /// With [`AffinityMode::Precomputed`], `points` is read as the affinity
    /// matrix itself.
    ///
    /// # Arguments
    ///
    /// * `points` - n × d matrix of n points in d dimensions
    pub fn fit(&self, points: &Array2<f64>) -> Result<SpectralFit> {
        let n = points.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        self.check_cluster_count(n)?;

        let affinity = build_affinity(points, self.affinity)?;
        self.fit_graph(affinity)
    }

    /// Fit using precomputed affinity matrix.
    pub fn fit_affinity(&self, affinity: &Array2<f64>) -> Result<SpectralFit> {
        let affinity = AffinityMatrix::precomputed(affinity)?;
        self.fit_graph(affinity)
    }

    fn check_cluster_count(&self, n: usize) -> Result<()> {
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        Ok(())
    }

    fn fit_graph(&self, affinity: AffinityMatrix) -> Result<SpectralFit> {
        let n = affinity.n();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        self.check_cluster_count(n)?;
        if !affinity.has_edges() {
            return Err(Error::InvalidParameter {
                name: "affinity",
                message: "has no positive off-diagonal entry",
            });
        }

        let laplacian = build_normalized_laplacian(&affinity);
        let components = Components::from_affinity(&affinity);
        let mut warnings = laplacian.warnings();
        let n_null = components.null_space_components().len();
        if n_null > 1 {
            log::warn!("affinity graph has {n_null} connected components");
            warnings.push(Warning::DisconnectedGraph {
                n_components: n_null,
            });
        }

        let decomposer = SpectralDecomposer::new()
            .with_jacobi(self.jacobi)
            .with_zero_space(self.zero_space);
        let eigenpairs =
            decomposer.smallest_eigenpairs_with_components(&laplacian, &components, self.k)?;

        let embedding = build_embedding(
            &eigenpairs.values,
            &eigenpairs.vectors,
            self.k,
            self.row_normalization,
        )?;

        let mut kmeans = Kmeans::new(self.k)
            .with_n_init(self.n_init)
            .with_max_iter(self.max_iter)
            .with_init(self.init);
        if let Some(seed) = self.seed {
            kmeans = kmeans.with_seed(seed);
        }
        let fit = kmeans.fit(&embedding)?;

        log::info!(
            "spectral clustering: n={n}, k={}, components={}, inertia={:.6e}",
            self.k,
            eigenpairs.n_components,
            fit.inertia
        );

        Ok(SpectralFit {
            n_components: eigenpairs.n_components,
            affinity,
            laplacian,
            eigenpairs,
            embedding,
            labels: fit.labels,
            inertia: fit.inertia,
            converged: fit.converged,
            warnings,
        })
    }
}

impl Clustering for SpectralClustering {
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>> {
        self.fit(data).map(|fit| fit.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}
