//! Symmetric normalized graph Laplacian.
//!
//! ```text
//! L = I − D^{-1/2} A D^{-1/2}
//! L[i][j] = δᵢⱼ − A[i][j] / sqrt(dᵢ dⱼ)
//! ```
//!
//! The diagonal of `A` is ignored. A vertex with zero degree is normalized as
//! if its degree were 1; its row and column of `L` reduce to the identity, so
//! it contributes eigenvalue 1 and stays out of the zero eigenspace.

use super::affinity::AffinityMatrix;
use crate::error::Warning;
use ndarray::{Array1, Array2};

/// Laplacian, degree vector and isolated vertices of one affinity graph.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLaplacian {
    /// Dense symmetric `n × n` Laplacian.
    pub matrix: Array2<f64>,
    /// Raw degrees (self-affinity excluded). Isolated vertices keep 0.
    pub degree: Array1<f64>,
    /// Vertices with zero degree, ascending.
    pub isolated: Vec<usize>,
}

impl NormalizedLaplacian {
    /// Number of vertices.
    pub fn n(&self) -> usize {
        self.matrix.nrows()
    }

    /// `D^{1/2}·1` normalized to unit length: the zero eigenvector of a
    /// connected graph.
    pub fn trivial_eigenvector(&self) -> Array1<f64> {
        let mut v = self.degree.mapv(f64::sqrt);
        let norm = v.dot(&v).sqrt();
        if norm > 0.0 {
            v /= norm;
        }
        v
    }

    /// One [`Warning::IsolatedVertex`] per isolated vertex.
    pub fn warnings(&self) -> Vec<Warning> {
        self.isolated
            .iter()
            .map(|&index| Warning::IsolatedVertex { index })
            .collect()
    }
}

/// Build `L = I − D^{-1/2} A D^{-1/2}` and the degree vector.
pub fn build_normalized_laplacian(affinity: &AffinityMatrix) -> NormalizedLaplacian {
    let n = affinity.n();
    let degree = Array1::from(affinity.degrees());

    let isolated: Vec<usize> = (0..n).filter(|&i| degree[i] == 0.0).collect();
    let inv_sqrt = degree.mapv(|d| if d == 0.0 { 1.0 } else { 1.0 / d.sqrt() });

    let mut matrix = Array2::eye(n);
    affinity.for_each_edge(|i, j, w| {
        // Scale by the product so (i, j) and (j, i) round identically.
        matrix[[i, j]] = -w * (inv_sqrt[i] * inv_sqrt[j]);
    });

    for &i in &isolated {
        log::warn!("vertex {i} has zero degree; treating it as isolated");
    }
    log::debug!("normalized laplacian: n={n}, isolated={}", isolated.len());

    NormalizedLaplacian {
        matrix,
        degree,
        isolated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_path_graph_entries() {
        // 0 - 1 - 2 with unit weights: degrees 1, 2, 1.
        let a = AffinityMatrix::precomputed(&array![
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0]
        ])
        .unwrap();
        let lap = build_normalized_laplacian(&a);
        assert_eq!(lap.degree, array![1.0, 2.0, 1.0]);
        assert_eq!(lap.matrix[[0, 0]], 1.0);
        assert_relative_eq!(lap.matrix[[0, 1]], -1.0 / 2f64.sqrt(), epsilon = 1e-15);
        assert_eq!(lap.matrix[[0, 2]], 0.0);
        assert_eq!(lap.matrix, lap.matrix.t().to_owned());
    }

    #[test]
    fn test_diagonal_of_affinity_is_ignored() {
        let with_loops = AffinityMatrix::precomputed(&array![[7.0, 1.0], [1.0, 3.0]]).unwrap();
        let without = AffinityMatrix::precomputed(&array![[0.0, 1.0], [1.0, 0.0]]).unwrap();
        assert_eq!(
            build_normalized_laplacian(&with_loops),
            build_normalized_laplacian(&without)
        );
    }

    #[test]
    fn test_isolated_vertex_is_identity_row() {
        let a = AffinityMatrix::precomputed(&array![
            [0.0, 2.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 0.0, 0.0]
        ])
        .unwrap();
        let lap = build_normalized_laplacian(&a);
        assert_eq!(lap.isolated, vec![2]);
        assert_eq!(lap.matrix.row(2).to_vec(), vec![0.0, 0.0, 1.0]);
        assert_eq!(lap.matrix.column(2).to_vec(), vec![0.0, 0.0, 1.0]);
        assert!(lap.matrix.iter().all(|v| v.is_finite()));
        assert_eq!(lap.warnings(), vec![Warning::IsolatedVertex { index: 2 }]);
    }

    #[test]
    fn test_trivial_eigenvector_is_in_kernel() {
        let a = AffinityMatrix::precomputed(&array![
            [0.0, 1.0, 0.5],
            [1.0, 0.0, 2.0],
            [0.5, 2.0, 0.0]
        ])
        .unwrap();
        let lap = build_normalized_laplacian(&a);
        let v = lap.trivial_eigenvector();
        let lv = lap.matrix.dot(&v);
        for x in lv.iter() {
            assert!(x.abs() < 1e-14);
        }
        assert_relative_eq!(v.dot(&v), 1.0, epsilon = 1e-14);
    }
}
