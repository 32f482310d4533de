//! Graph construction: affinities, connectivity, and the normalized Laplacian.
//!
//! ```text
//! points ──build_affinity──► A ──build_normalized_laplacian──► (L, degree)
//!                            │
//!                            └──Components::from_affinity──► component labels
//! ```

mod affinity;
mod components;
mod laplacian;
mod sparse;

pub use affinity::{build_affinity, knn_affinity, rbf_affinity, AffinityMatrix, AffinityMode};
pub use components::Components;
pub use laplacian::{build_normalized_laplacian, NormalizedLaplacian};
pub use sparse::CsrMatrix;

pub(crate) use affinity::squared_distance;
