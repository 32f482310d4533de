//! Compressed sparse row storage for affinity graphs.
//!
//! k-NN affinities touch at most `n·(m+1)` entries per direction, so they are
//! kept in CSR form until the (dense) Laplacian is formed.

use crate::{Error, Result};
use ndarray::Array2;

/// A square CSR matrix with `f64` weights.
///
/// Column indices are sorted within each row and unique.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Build an `n × n` matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate coordinates are summed. Explicit zeros are dropped.
    pub fn from_triplets(n: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        let mut entries: Vec<(usize, usize, f64)> = Vec::with_capacity(triplets.len());
        for &(r, c, w) in triplets {
            if r >= n || c >= n {
                return Err(Error::ShapeMismatch {
                    expected: format!("indices < {n}"),
                    actual: format!("({r}, {c})"),
                });
            }
            entries.push((r, c, w));
        }
        Ok(Self::assemble(n, entries))
    }

    fn assemble(n: usize, mut entries: Vec<(usize, usize, f64)>) -> Self {
        entries.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut merged: Vec<(usize, usize, f64)> = Vec::with_capacity(entries.len());
        for (r, c, w) in entries {
            if let Some((pr, pc, pw)) = merged.last_mut() {
                if *pr == r && *pc == c {
                    *pw += w;
                    continue;
                }
            }
            merged.push((r, c, w));
        }
        merged.retain(|&(_, _, w)| w != 0.0);

        let mut row_ptr = vec![0usize; n + 1];
        for &(r, _, _) in &merged {
            row_ptr[r + 1] += 1;
        }
        for i in 0..n {
            row_ptr[i + 1] += row_ptr[i];
        }

        let col_idx = merged.iter().map(|&(_, c, _)| c).collect();
        let values = merged.iter().map(|&(_, _, w)| w).collect();

        Self {
            n,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Matrix dimension.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Stored `(col, value)` pairs of row `i`.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        self.col_idx[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter().copied())
    }

    /// Entry `(i, j)`, zero when not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (start, end) = (self.row_ptr[i], self.row_ptr[i + 1]);
        match self.col_idx[start..end].binary_search(&j) {
            Ok(pos) => self.values[start + pos],
            Err(_) => 0.0,
        }
    }

    /// Return `0.5 * (self + selfᵀ)`.
    pub fn symmetrized(&self) -> Self {
        let mut triplets = Vec::with_capacity(2 * self.nnz());
        for i in 0..self.n {
            for (j, w) in self.row(i) {
                triplets.push((i, j, 0.5 * w));
                triplets.push((j, i, 0.5 * w));
            }
        }
        Self::assemble(self.n, triplets)
    }

    /// Dense copy.
    pub fn to_dense(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.n, self.n));
        for i in 0..self.n {
            for (j, w) in self.row(i) {
                out[[i, j]] = w;
            }
        }
        out
    }
}
