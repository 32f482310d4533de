//! Affinity (similarity) graphs built from raw feature vectors.
//!
//! Two constructions are supported, plus validated user-supplied matrices:
//!
//! | Mode | Weights | Storage |
//! |------|---------|---------|
//! | RBF | `exp(-γ‖xᵢ − xⱼ‖²)` | dense |
//! | k-NN | `0.5·(C + Cᵀ)` ∈ {0, 0.5, 1} | CSR |
//! | Precomputed | as given, re-symmetrized | dense |
//!
//! The RBF diagonal keeps the kernel's natural value 1.0 and the k-NN
//! connectivity includes each point itself. Self-affinity never reaches the
//! Laplacian: [`crate::graph::build_normalized_laplacian`] ignores the diagonal.

use super::sparse::CsrMatrix;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView1};

/// Symmetry tolerance for user-supplied affinities.
const SYMMETRY_TOL: f64 = 1e-6;

/// How to turn points into an affinity matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AffinityMode {
    /// Gaussian kernel `exp(-γ‖x − y‖²)`. `None` uses `γ = 1/d`.
    Rbf {
        /// Kernel coefficient.
        gamma: Option<f64>,
    },
    /// Symmetrized k-nearest-neighbour connectivity.
    Knn {
        /// Neighbours per point, not counting the point itself.
        n_neighbors: usize,
    },
    /// The input already is an affinity matrix.
    Precomputed,
}

impl Default for AffinityMode {
    fn default() -> Self {
        AffinityMode::Rbf { gamma: None }
    }
}

/// A symmetric non-negative `n × n` affinity matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum AffinityMatrix {
    /// Dense storage (RBF and precomputed affinities).
    Dense(Array2<f64>),
    /// Sparse storage (k-NN affinities).
    Sparse(CsrMatrix),
}

impl AffinityMatrix {
    /// Validate and wrap a user-supplied affinity matrix.
    ///
    /// The matrix must be square, finite, non-negative and symmetric within
    /// `1e-6`. The stored copy is exactly symmetric.
    pub fn precomputed(matrix: &Array2<f64>) -> Result<Self> {
        let (rows, cols) = matrix.dim();
        if rows == 0 {
            return Err(Error::EmptyInput);
        }
        if rows != cols {
            return Err(Error::ShapeMismatch {
                expected: format!("{rows} x {rows}"),
                actual: format!("{rows} x {cols}"),
            });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "affinity",
                message: "must contain only finite values",
            });
        }
        if matrix.iter().any(|&v| v < 0.0) {
            return Err(Error::InvalidParameter {
                name: "affinity",
                message: "must be non-negative",
            });
        }
        for i in 0..rows {
            for j in (i + 1)..rows {
                if (matrix[[i, j]] - matrix[[j, i]]).abs() > SYMMETRY_TOL {
                    return Err(Error::InvalidParameter {
                        name: "affinity",
                        message: "must be symmetric",
                    });
                }
            }
        }

        let sym = (matrix + &matrix.t()) * 0.5;
        Ok(AffinityMatrix::Dense(sym))
    }

    /// Number of vertices.
    pub fn n(&self) -> usize {
        match self {
            AffinityMatrix::Dense(a) => a.nrows(),
            AffinityMatrix::Sparse(a) => a.n(),
        }
    }

    /// Entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match self {
            AffinityMatrix::Dense(a) => a[[i, j]],
            AffinityMatrix::Sparse(a) => a.get(i, j),
        }
    }

    /// Call `f(i, j, w)` for every off-diagonal entry with `w > 0`.
    ///
    /// Both orientations of an edge are visited.
    pub fn for_each_edge<F: FnMut(usize, usize, f64)>(&self, mut f: F) {
        match self {
            AffinityMatrix::Dense(a) => {
                for ((i, j), &w) in a.indexed_iter() {
                    if i != j && w > 0.0 {
                        f(i, j, w);
                    }
                }
            }
            AffinityMatrix::Sparse(a) => {
                for i in 0..a.n() {
                    for (j, w) in a.row(i) {
                        if i != j && w > 0.0 {
                            f(i, j, w);
                        }
                    }
                }
            }
        }
    }

    /// `degree[i] = Σ_{j≠i} A[i][j]`.
    pub fn degrees(&self) -> Vec<f64> {
        let mut degree = vec![0.0; self.n()];
        self.for_each_edge(|i, _, w| degree[i] += w);
        degree
    }

    /// Whether any off-diagonal weight is positive.
    pub fn has_edges(&self) -> bool {
        match self {
            AffinityMatrix::Dense(a) => a
                .indexed_iter()
                .any(|((i, j), &w)| i != j && w > 0.0),
            AffinityMatrix::Sparse(a) => {
                (0..a.n()).any(|i| a.row(i).any(|(j, w)| i != j && w > 0.0))
            }
        }
    }

    /// Dense copy of the matrix.
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            AffinityMatrix::Dense(a) => a.clone(),
            AffinityMatrix::Sparse(a) => a.to_dense(),
        }
    }
}

/// Build an affinity matrix from an `n × d` point matrix.
///
/// `AffinityMode::Precomputed` treats `points` itself as the affinity.
///
/// # Errors
///
/// - [`Error::EmptyInput`] when there are no points.
/// - [`Error::InvalidParameter`] for non-finite coordinates, `γ ≤ 0`, or
///   `n_neighbors` outside `1..n`.
pub fn build_affinity(points: &Array2<f64>, mode: AffinityMode) -> Result<AffinityMatrix> {
    match mode {
        AffinityMode::Precomputed => AffinityMatrix::precomputed(points),
        AffinityMode::Rbf { gamma } => {
            validate_points(points)?;
            let gamma = gamma.unwrap_or(1.0 / points.ncols() as f64);
            rbf_affinity(points, gamma).map(AffinityMatrix::Dense)
        }
        AffinityMode::Knn { n_neighbors } => {
            validate_points(points)?;
            knn_affinity(points, n_neighbors).map(AffinityMatrix::Sparse)
        }
    }
}

fn validate_points(points: &Array2<f64>) -> Result<()> {
    let (n, d) = points.dim();
    if n == 0 || d == 0 {
        return Err(Error::EmptyInput);
    }
    if points.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "points",
            message: "must contain only finite values",
        });
    }
    Ok(())
}

/// Dense RBF kernel matrix. The diagonal is exactly 1.
pub fn rbf_affinity(points: &Array2<f64>, gamma: f64) -> Result<Array2<f64>> {
    if !gamma.is_finite() || gamma < 0.0 {
        return Err(Error::InvalidParameter {
            name: "gamma",
            message: "must be a finite non-negative number",
        });
    }
    if gamma == 0.0 {
        return Err(Error::InvalidParameter {
            name: "gamma",
            message: "zero gives a uniform, uninformative affinity",
        });
    }

    let n = points.nrows();
    let mut a = Array2::zeros((n, n));
    for i in 0..n {
        a[[i, i]] = 1.0;
        let xi = points.row(i);
        for j in (i + 1)..n {
            let w = (-gamma * squared_distance(&xi, &points.row(j))).exp();
            a[[i, j]] = w;
            a[[j, i]] = w;
        }
    }

    log::debug!("rbf affinity: n={n}, gamma={gamma:.4e}");
    Ok(a)
}

/// Sparse symmetrized k-NN connectivity.
///
/// Each row of the raw connectivity `C` holds the point itself plus its
/// `n_neighbors` nearest other points. Equidistant candidates are ordered by
/// index, so coincident points resolve deterministically.
pub fn knn_affinity(points: &Array2<f64>, n_neighbors: usize) -> Result<CsrMatrix> {
    let n = points.nrows();
    if n_neighbors == 0 {
        return Err(Error::InvalidParameter {
            name: "n_neighbors",
            message: "must be at least 1",
        });
    }
    if n_neighbors >= n {
        return Err(Error::InvalidParameter {
            name: "n_neighbors",
            message: "must be smaller than the number of points",
        });
    }

    let mut triplets = Vec::with_capacity(n * (n_neighbors + 1));
    let mut candidates: Vec<(f64, usize)> = Vec::with_capacity(n - 1);
    for i in 0..n {
        let xi = points.row(i);
        candidates.clear();
        candidates.extend(
            (0..n)
                .filter(|&j| j != i)
                .map(|j| (squared_distance(&xi, &points.row(j)), j)),
        );
        // Stable sort on distance keeps ascending index order among ties.
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

        triplets.push((i, i, 1.0));
        for &(_, j) in candidates.iter().take(n_neighbors) {
            triplets.push((i, j, 1.0));
        }
    }

    let connectivity = CsrMatrix::from_triplets(n, &triplets)?;
    let affinity = connectivity.symmetrized();
    log::debug!(
        "knn affinity: n={n}, n_neighbors={n_neighbors}, nnz={}",
        affinity.nnz()
    );
    Ok(affinity)
}

pub(crate) fn squared_distance(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
