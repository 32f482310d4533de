//! Smallest eigenpairs of the normalized Laplacian.
//!
//! # Connected vs disconnected graphs
//!
//! For a connected graph the eigenvalue 0 is simple and any accurate symmetric
//! solver recovers `D^{1/2}·1` (normalized) as the first eigenvector.
//!
//! With `c > 1` components the zero eigenvalue has multiplicity `c`. Every
//! orthonormal basis of that eigenspace is equally valid, so a dense solver
//! returns an arbitrary rotation of it, polluted by roundoff. Instead the
//! component structure is found by traversal and the zero eigenspace is
//! written down directly in a canonical basis ([`ZeroSpaceBasis`]). Only the
//! remaining pairs come from the solver, re-orthogonalized against that
//! basis.

use super::jacobi::{jacobi_eigen, JacobiConfig};
use crate::graph::{Components, NormalizedLaplacian};
use crate::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1};

/// Vectors whose norm drops below this after projection are rejected.
const COLLAPSE_TOL: f64 = 1e-8;

/// Canonical basis of the zero eigenspace of a disconnected graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ZeroSpaceBasis {
    /// `1/sqrt(|S|)` on the vertices of component `S`, 0 elsewhere.
    #[default]
    Indicator,
    /// `D^{1/2}·1_S` normalized: the exact kernel vectors of `L`.
    DegreeWeighted,
}

/// The `k` smallest eigenpairs of a Laplacian.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPairs {
    /// Eigenvalues, ascending.
    pub values: Array1<f64>,
    /// Unit eigenvectors as columns (`n × k`).
    pub vectors: Array2<f64>,
    /// Multiplicity of the zero eigenvalue (components with an edge).
    pub n_components: usize,
}

impl EigenPairs {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no pair was requested.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the underlying graph is connected.
    pub fn is_connected(&self) -> bool {
        self.n_components <= 1
    }
}

/// Spectral decomposer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpectralDecomposer {
    /// Eigensolver stopping rules.
    pub jacobi: JacobiConfig,
    /// Basis for the zero eigenspace when the graph is disconnected.
    pub zero_space: ZeroSpaceBasis,
}

impl SpectralDecomposer {
    /// Decomposer with default solver settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the eigensolver configuration.
    pub fn with_jacobi(mut self, jacobi: JacobiConfig) -> Self {
        self.jacobi = jacobi;
        self
    }

    /// Set the zero-eigenspace basis convention.
    pub fn with_zero_space(mut self, basis: ZeroSpaceBasis) -> Self {
        self.zero_space = basis;
        self
    }

    /// `k` smallest eigenpairs; connectivity read off the Laplacian pattern.
    pub fn smallest_eigenpairs(
        &self,
        laplacian: &NormalizedLaplacian,
        k: usize,
    ) -> Result<EigenPairs> {
        let components = Components::from_laplacian(&laplacian.matrix);
        self.smallest_eigenpairs_with_components(laplacian, &components, k)
    }

    /// `k` smallest eigenpairs for precomputed components.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParameter`] when `k == 0` or `k > n`, or when
    ///   `components` does not match the Laplacian size.
    /// - [`Error::ConvergenceFailure`] from the eigensolver.
    /// - [`Error::RankDeficient`] when the complement of the zero eigenspace
    ///   cannot supply enough independent vectors.
    pub fn smallest_eigenpairs_with_components(
        &self,
        laplacian: &NormalizedLaplacian,
        components: &Components,
        k: usize,
    ) -> Result<EigenPairs> {
        let n = laplacian.n();
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if k > n {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "cannot exceed the number of vertices",
            });
        }
        if components.labels().len() != n {
            return Err(Error::InvalidParameter {
                name: "components",
                message: "labelling does not match the Laplacian size",
            });
        }

        let null_components = components.null_space_components();
        let c = null_components.len();

        if c <= 1 {
            log::debug!("decompose: connected graph, n={n}, k={k}");
            return self.connected(laplacian, k);
        }

        log::debug!("decompose: {c} components, n={n}, k={k}");
        let basis = self.zero_space_basis(laplacian, components, &null_components);
        self.disconnected(laplacian, basis, k)
    }

    fn connected(&self, laplacian: &NormalizedLaplacian, k: usize) -> Result<EigenPairs> {
        let full = jacobi_eigen(&laplacian.matrix, &self.jacobi)?;
        let clamp = self.jacobi.tolerance.max(f64::EPSILON) * laplacian.n() as f64;

        let values = full
            .values
            .iter()
            .take(k)
            .map(|&v| if v < 0.0 && v > -clamp { 0.0 } else { v })
            .collect::<Array1<f64>>();

        let mut vectors = full.vectors.slice(ndarray::s![.., ..k]).to_owned();
        for mut col in vectors.columns_mut() {
            let sign = canonical_sign(&col.view());
            col *= sign;
        }

        let n_components = usize::from(laplacian.n() > laplacian.isolated.len());
        Ok(EigenPairs {
            values,
            vectors,
            n_components,
        })
    }

    fn disconnected(
        &self,
        laplacian: &NormalizedLaplacian,
        basis: Vec<Array1<f64>>,
        k: usize,
    ) -> Result<EigenPairs> {
        let n = laplacian.n();
        let c = basis.len();

        if k <= c {
            let mut vectors = Array2::zeros((n, k));
            for (j, b) in basis.iter().take(k).enumerate() {
                vectors.column_mut(j).assign(b);
            }
            return Ok(EigenPairs {
                values: Array1::zeros(k),
                vectors,
                n_components: c,
            });
        }

        let full = jacobi_eigen(&laplacian.matrix, &self.jacobi)?;

        let mut accepted: Vec<Array1<f64>> = basis;
        let mut values: Vec<f64> = vec![0.0; c];
        for idx in c..n {
            if accepted.len() == k {
                break;
            }
            let mut candidate = full.vectors.column(idx).to_owned();
            // Two passes of modified Gram-Schmidt.
            for _ in 0..2 {
                for b in &accepted {
                    let proj = candidate.dot(b);
                    candidate.scaled_add(-proj, b);
                }
            }
            let norm = candidate.dot(&candidate).sqrt();
            if norm < COLLAPSE_TOL {
                log::debug!("decompose: eigenvector {idx} collapsed under projection");
                continue;
            }
            candidate /= norm;
            let sign = canonical_sign(&candidate.view());
            candidate *= sign;

            values.push(full.values[idx].max(0.0));
            accepted.push(candidate);
        }

        if accepted.len() < k {
            return Err(Error::RankDeficient {
                requested: k,
                found: accepted.len(),
            });
        }

        let mut vectors = Array2::zeros((n, k));
        for (j, v) in accepted.iter().enumerate() {
            vectors.column_mut(j).assign(v);
        }

        Ok(EigenPairs {
            values: Array1::from(values),
            vectors,
            n_components: c,
        })
    }

    fn zero_space_basis(
        &self,
        laplacian: &NormalizedLaplacian,
        components: &Components,
        null_components: &[usize],
    ) -> Vec<Array1<f64>> {
        let n = laplacian.n();
        null_components
            .iter()
            .map(|&comp| {
                let members = components.members(comp);
                let mut v = Array1::zeros(n);
                match self.zero_space {
                    ZeroSpaceBasis::Indicator => {
                        let value = 1.0 / (members.len() as f64).sqrt();
                        for &i in &members {
                            v[i] = value;
                        }
                    }
                    ZeroSpaceBasis::DegreeWeighted => {
                        let total: f64 = members.iter().map(|&i| laplacian.degree[i]).sum();
                        let scale = 1.0 / total.sqrt();
                        for &i in &members {
                            v[i] = laplacian.degree[i].sqrt() * scale;
                        }
                    }
                }
                v
            })
            .collect()
    }
}

/// `k` smallest eigenpairs with default settings.
///
/// See [`SpectralDecomposer::smallest_eigenpairs`].
pub fn smallest_eigenpairs(laplacian: &NormalizedLaplacian, k: usize) -> Result<EigenPairs> {
    SpectralDecomposer::default().smallest_eigenpairs(laplacian, k)
}

/// Sign that makes the largest-magnitude entry positive (lowest index on ties).
fn canonical_sign(v: &ArrayView1<'_, f64>) -> f64 {
    let mut best = 0.0f64;
    for &x in v.iter() {
        if x.abs() > best.abs() {
            best = x;
        }
    }
    if best < 0.0 {
        -1.0
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_normalized_laplacian, AffinityMatrix};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn laplacian_of(a: Array2<f64>) -> NormalizedLaplacian {
        build_normalized_laplacian(&AffinityMatrix::precomputed(&a).unwrap())
    }

    /// Two triangles joined by nothing, plus a weighted pair inside each.
    fn two_triangles() -> Array2<f64> {
        array![
            [0.0, 1.0, 2.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            [2.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 1.0, 1.0],
            [0.0, 0.0, 0.0, 1.0, 0.0, 3.0],
            [0.0, 0.0, 0.0, 1.0, 3.0, 0.0],
        ]
    }

    #[test]
    fn test_connected_first_vector_is_trivial() {
        let lap = laplacian_of(array![
            [0.0, 1.0, 0.2, 0.0],
            [1.0, 0.0, 1.0, 0.5],
            [0.2, 1.0, 0.0, 1.0],
            [0.0, 0.5, 1.0, 0.0]
        ]);
        let pairs = smallest_eigenpairs(&lap, 2).unwrap();
        assert!(pairs.is_connected());
        assert!(pairs.values[0].abs() < 1e-10);
        assert!(pairs.values[1] > 1e-3);

        let trivial = lap.trivial_eigenvector();
        let cos = pairs.vectors.column(0).dot(&trivial).abs();
        assert!(cos > 1.0 - 1e-6, "cosine {cos}");
    }

    #[test]
    fn test_disconnected_indicator_basis() {
        let lap = laplacian_of(two_triangles());
        let pairs = smallest_eigenpairs(&lap, 2).unwrap();
        assert_eq!(pairs.n_components, 2);
        assert_eq!(pairs.values, array![0.0, 0.0]);

        let s = 1.0 / 3f64.sqrt();
        assert_eq!(
            pairs.vectors.column(0).to_vec(),
            vec![s, s, s, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            pairs.vectors.column(1).to_vec(),
            vec![0.0, 0.0, 0.0, s, s, s]
        );
    }

    #[test]
    fn test_disconnected_degree_weighted_basis_is_exact() {
        let lap = laplacian_of(two_triangles());
        let pairs = SpectralDecomposer::new()
            .with_zero_space(ZeroSpaceBasis::DegreeWeighted)
            .smallest_eigenpairs(&lap, 2)
            .unwrap();
        for j in 0..2 {
            let v = pairs.vectors.column(j);
            let lv = lap.matrix.dot(&v);
            assert!(lv.iter().all(|x| x.abs() < 1e-14));
            assert_relative_eq!(v.dot(&v), 1.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_disconnected_extra_pairs_are_orthonormal() {
        let lap = laplacian_of(two_triangles());
        let pairs = SpectralDecomposer::new()
            .with_zero_space(ZeroSpaceBasis::DegreeWeighted)
            .smallest_eigenpairs(&lap, 4)
            .unwrap();
        assert_eq!(pairs.len(), 4);
        assert_eq!(pairs.values[0], 0.0);
        assert_eq!(pairs.values[1], 0.0);
        assert!(pairs.values[2] > 0.1);
        assert!(pairs.values[2] <= pairs.values[3]);

        let gram = pairs.vectors.t().dot(&pairs.vectors);
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(gram[[i, j]], expected, epsilon = 1e-10);
            }
        }

        // With the exact kernel basis the extra columns are true eigenvectors.
        for j in 2..4 {
            let v = pairs.vectors.column(j);
            let r = lap.matrix.dot(&v) - &v * pairs.values[j];
            assert!(r.dot(&r).sqrt() < 1e-9);
        }
    }

    #[test]
    fn test_isolated_vertex_is_not_a_zero_eigenvalue() {
        let lap = laplacian_of(array![
            [0.0, 1.0, 1.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0]
        ]);
        let pairs = smallest_eigenpairs(&lap, 4).unwrap();
        assert_eq!(pairs.n_components, 1);
        let zeros = pairs.values.iter().filter(|v| v.abs() < 1e-10).count();
        assert_eq!(zeros, 1);
        // Triangle spectrum {0, 1.5, 1.5} plus the isolated vertex at 1.
        assert_relative_eq!(pairs.values[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_k() {
        let lap = laplacian_of(two_triangles());
        assert!(matches!(
            smallest_eigenpairs(&lap, 0),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            smallest_eigenpairs(&lap, 7),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn test_sign_is_canonical() {
        let lap = laplacian_of(array![
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 0.0]
        ]);
        let pairs = smallest_eigenpairs(&lap, 3).unwrap();
        for col in pairs.vectors.columns() {
            let max = col.iter().copied().fold(0.0f64, |m, x| if x.abs() > m.abs() { x } else { m });
            assert!(max > 0.0);
        }
    }
}
