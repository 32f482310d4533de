//! Cyclic Jacobi eigensolver for dense symmetric matrices.
//!
//! Each sweep visits every off-diagonal pair `(p, q)` once and applies the
//! plane rotation that annihilates `a_pq`. The off-diagonal mass decreases
//! monotonically and convergence is quadratic once the eigenvalues separate.
//! Rotations are accumulated into `V`, so on exit `A = V Λ Vᵀ` with
//! orthonormal columns.
//!
//! Jacobi is slow for large `n` (`O(n³)` per sweep) but very accurate for
//! small eigenvalues, which is what spectral clustering consumes.

use crate::{Error, Result};
use ndarray::{Array1, Array2};

/// Stopping rules for [`jacobi_eigen`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JacobiConfig {
    /// Maximum number of full sweeps.
    pub max_sweeps: usize,
    /// Relative bound on the off-diagonal Frobenius norm.
    pub tolerance: f64,
}

impl Default for JacobiConfig {
    fn default() -> Self {
        Self {
            max_sweeps: 100,
            tolerance: 1e-12,
        }
    }
}

/// Full eigendecomposition, eigenvalues ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigendecomposition {
    /// Eigenvalues, ascending.
    pub values: Array1<f64>,
    /// Unit eigenvectors as columns, aligned with `values`.
    pub vectors: Array2<f64>,
    /// Sweeps performed.
    pub sweeps: usize,
}

/// Decompose a symmetric matrix.
///
/// Converged when `‖offdiag(A)‖_F ≤ tolerance · max(1, ‖A‖_F)`.
///
/// # Errors
///
/// - [`Error::ShapeMismatch`] for a non-square matrix.
/// - [`Error::InvalidParameter`] for non-finite entries or tolerance.
/// - [`Error::ConvergenceFailure`] when `max_sweeps` runs out first.
pub fn jacobi_eigen(matrix: &Array2<f64>, config: &JacobiConfig) -> Result<Eigendecomposition> {
    let (n, cols) = matrix.dim();
    if n != cols {
        return Err(Error::ShapeMismatch {
            expected: format!("{n} x {n}"),
            actual: format!("{n} x {cols}"),
        });
    }
    if !(config.tolerance.is_finite() && config.tolerance > 0.0) {
        return Err(Error::InvalidParameter {
            name: "tolerance",
            message: "must be a positive finite number",
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidParameter {
            name: "matrix",
            message: "must contain only finite values",
        });
    }

    let mut a = matrix.to_owned();
    let mut v = Array2::<f64>::eye(n);
    let frobenius = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let threshold = config.tolerance * frobenius.max(1.0);

    let mut sweep = 0;
    loop {
        let off = off_diagonal_norm(&a);
        if off <= threshold {
            log::debug!("jacobi: n={n} converged after {sweep} sweeps (off={off:.3e})");
            break;
        }
        if sweep == config.max_sweeps {
            log::warn!("jacobi: no convergence after {sweep} sweeps (off={off:.3e})");
            return Err(Error::ConvergenceFailure {
                iterations: sweep,
                residual: off,
            });
        }

        for p in 0..n.saturating_sub(1) {
            for q in (p + 1)..n {
                if a[[p, q]] != 0.0 {
                    rotate(&mut a, &mut v, p, q);
                }
            }
        }
        sweep += 1;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[[i, i]].total_cmp(&a[[j, j]]));

    let values = Array1::from_iter(order.iter().map(|&i| a[[i, i]]));
    let mut vectors = Array2::zeros((n, n));
    for (dst, &src) in order.iter().enumerate() {
        vectors.column_mut(dst).assign(&v.column(src));
    }

    Ok(Eigendecomposition {
        values,
        vectors,
        sweeps: sweep,
    })
}

/// Annihilate `a[p][q]` with a plane rotation and accumulate it into `v`.
fn rotate(a: &mut Array2<f64>, v: &mut Array2<f64>, p: usize, q: usize) {
    let n = a.nrows();
    let apq = a[[p, q]];
    let app = a[[p, p]];
    let aqq = a[[q, q]];

    let theta = (aqq - app) / (2.0 * apq);
    let t = if theta.is_finite() {
        theta.signum() / (theta.abs() + theta.hypot(1.0))
    } else {
        0.0
    };
    let c = 1.0 / t.hypot(1.0);
    let s = t * c;

    a[[p, p]] = app - t * apq;
    a[[q, q]] = aqq + t * apq;
    a[[p, q]] = 0.0;
    a[[q, p]] = 0.0;

    for r in 0..n {
        if r == p || r == q {
            continue;
        }
        let arp = a[[r, p]];
        let arq = a[[r, q]];
        let new_rp = c * arp - s * arq;
        let new_rq = s * arp + c * arq;
        a[[r, p]] = new_rp;
        a[[p, r]] = new_rp;
        a[[r, q]] = new_rq;
        a[[q, r]] = new_rq;
    }

    for r in 0..n {
        let vrp = v[[r, p]];
        let vrq = v[[r, q]];
        v[[r, p]] = c * vrp - s * vrq;
        v[[r, q]] = s * vrp + c * vrq;
    }
}

fn off_diagonal_norm(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += a[[i, j]] * a[[i, j]];
        }
    }
    (2.0 * sum).sqrt()
}
