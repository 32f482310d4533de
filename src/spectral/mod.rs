//! Eigendecomposition of the normalized Laplacian and the spectral embedding.

mod decompose;
mod embedding;
mod jacobi;

pub use decompose::{smallest_eigenpairs, EigenPairs, SpectralDecomposer, ZeroSpaceBasis};
pub use embedding::{build_embedding, normalize_rows, RowNormalization};
pub use jacobi::{jacobi_eigen, Eigendecomposition, JacobiConfig};
