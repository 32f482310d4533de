//! Diffusion-map embedding: one row per vertex, one column per eigenpair.
//!
//! ```text
//! embedding[:, i] = vectors[:, i] · sqrt(max(0, 1 − values[i]))
//! ```
//!
//! Eigenvalues at or above 1 contribute a zero column.

use crate::{Error, Result};
use ndarray::{Array1, Array2};

/// Added to row norms before dividing.
const ROW_NORM_EPS: f64 = 1e-10;

/// Row post-processing applied after scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RowNormalization {
    /// Scaled eigenvector coordinates as they are.
    #[default]
    None,
    /// Every row divided by `‖row‖ + 1e-10` (Ng-Jordan-Weiss).
    UnitNorm,
}

/// `n × k` embedding from the first `k` eigenpairs.
///
/// # Errors
///
/// - [`Error::InvalidParameter`] when `k` is 0 or exceeds the number of pairs.
/// - [`Error::DimensionMismatch`] when `values` and the columns of
///   `vectors` disagree.
pub fn build_embedding(
    values: &Array1<f64>,
    vectors: &Array2<f64>,
    k: usize,
    normalization: RowNormalization,
) -> Result<Array2<f64>> {
    if values.len() != vectors.ncols() {
        return Err(Error::DimensionMismatch {
            expected: vectors.ncols(),
            found: values.len(),
        });
    }
    if k == 0 || k > values.len() {
        return Err(Error::InvalidParameter {
            name: "k",
            message: "must be between 1 and the number of eigenpairs",
        });
    }

    let mut embedding = Array2::zeros((vectors.nrows(), k));
    for i in 0..k {
        let scale = (1.0 - values[i]).max(0.0).sqrt();
        let mut col = embedding.column_mut(i);
        col.assign(&vectors.column(i));
        col *= scale;
    }

    if normalization == RowNormalization::UnitNorm {
        normalize_rows(&mut embedding);
    }
    log::debug!(
        "embedding: {}x{k}, normalization={normalization:?}",
        embedding.nrows()
    );
    Ok(embedding)
}

/// Scale every row to (almost) unit length in place.
pub fn normalize_rows(x: &mut Array2<f64>) {
    for mut row in x.rows_mut() {
        let norm = row.dot(&row).sqrt();
        row /= norm + ROW_NORM_EPS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn fixture() -> (Array1<f64>, Array2<f64>) {
        (
            array![0.0, 0.75, 1.2],
            array![[3.0, 4.0, 1.0], [0.0, 2.0, 1.0], [0.0, 0.0, 1.0]],
        )
    }

    #[test]
    fn test_diffusion_scaling() {
        let (values, vectors) = fixture();
        let e = build_embedding(&values, &vectors, 3, RowNormalization::None).unwrap();
        // Scales are 1, 0.5 and 0.
        assert_eq!(
            e,
            array![[3.0, 2.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_takes_leading_pairs() {
        let (values, vectors) = fixture();
        let e = build_embedding(&values, &vectors, 1, RowNormalization::None).unwrap();
        assert_eq!(e, array![[3.0], [0.0], [0.0]]);
    }

    #[test]
    fn test_unit_norm_rows() {
        let values = array![0.0, 0.0];
        let vectors = array![[3.0, 4.0], [0.0, 2.0], [0.0, 0.0]];
        let e = build_embedding(&values, &vectors, 2, RowNormalization::UnitNorm).unwrap();
        assert_relative_eq!(e[[0, 0]], 0.6, epsilon = 1e-9);
        assert_relative_eq!(e[[0, 1]], 0.8, epsilon = 1e-9);
        assert_relative_eq!(e[[1, 1]], 1.0, epsilon = 1e-9);
        assert_eq!(e.row(2).to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_repeated_calls_are_bit_identical() {
        let (values, vectors) = fixture();
        for mode in [RowNormalization::None, RowNormalization::UnitNorm] {
            let a = build_embedding(&values, &vectors, 3, mode).unwrap();
            let b = build_embedding(&values, &vectors, 3, mode).unwrap();
            let bits_a: Vec<u64> = a.iter().map(|x| x.to_bits()).collect();
            let bits_b: Vec<u64> = b.iter().map(|x| x.to_bits()).collect();
            assert_eq!(bits_a, bits_b);
        }
    }

    #[test]
    fn test_row_normalization_is_idempotent() {
        let (_, mut once) = fixture();
        normalize_rows(&mut once);
        let mut twice = once.clone();
        normalize_rows(&mut twice);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rejects_out_of_range_k() {
        let (values, vectors) = fixture();
        assert!(matches!(
            build_embedding(&values, &vectors, 0, RowNormalization::None),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            build_embedding(&values, &vectors, 4, RowNormalization::None),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            build_embedding(&array![0.0], &vectors, 1, RowNormalization::None),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
