//! Clustering evaluation metrics.
//!
//! Two families:
//!
//! - **External** scores compare a clustering to ground-truth labels.
//! - **Internal** scores judge a clustering from the data alone.
//!
//! # Metrics Overview
//!
//! | Metric | Kind | Range | Best |
//! |--------|------|-------|------|
//! | [`ari`] | external | [-1, 1] | 1 |
//! | [`nmi`] | external | [0, 1] | 1 |
//! | [`silhouette_score`] | internal | [-1, 1] | 1 |
//! | [`calinski_harabasz`] | internal | [0, ∞) | higher |
//! | [`davies_bouldin`] | internal | [0, ∞) | lower |
//!
//! # Example
//!
//! ```rust
//! use spectra::metrics::{ari, nmi};
//!
//! let pred = [0, 0, 1, 1, 2, 2];
//! let truth = [0, 0, 0, 1, 1, 1];
//!
//! let nmi_score = nmi(&pred, &truth);
//! let ari_score = ari(&pred, &truth);
//! assert!(ari_score < nmi_score);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)
//! - Rousseeuw (1987). "Silhouettes"
//! - Caliński & Harabasz (1974). "A dendrite method for cluster analysis"
//! - Davies & Bouldin (1979). "A cluster separation measure"

use std::collections::{BTreeMap, HashMap};

use ndarray::{Array1, Array2};

use crate::graph::squared_distance;
use crate::{Error, Result};

/// Normalized Mutual Information between two clusterings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// where I(U; V) is mutual information and H is entropy.
///
/// Returns 0 for empty or mismatched inputs, and 1 when both clusterings
/// are constant.
///
/// # Example
///
/// ```rust
/// use spectra::metrics::nmi;
///
/// // Perfect clustering
/// let pred = [0, 0, 1, 1];
/// let truth = [0, 0, 1, 1];
/// assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
///
/// // Random clustering has low NMI
/// let pred = [0, 1, 0, 1];
/// let truth = [0, 0, 1, 1];
/// assert!(nmi(&pred, &truth) < 0.5);
/// ```
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n_f = pred.len() as f64;
    let joint = build_contingency_table(pred, truth);
    let p_pred = label_counts(pred);
    let p_truth = label_counts(truth);

    let h_pred = entropy(&p_pred, n_f);
    let h_truth = entropy(&p_truth, n_f);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n_f;
        let p_p = *p_pred.get(&p).unwrap_or(&0) as f64 / n_f;
        let p_t = *p_truth.get(&t).unwrap_or(&0) as f64 / n_f;
        if p_p > 0.0 && p_t > 0.0 {
            mi += p_joint * (p_joint / (p_p * p_t)).ln();
        }
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        2.0 * mi / denom
    } else {
        1.0 // Both are constant
    }
}

/// Adjusted Rand Index between two clusterings.
///
/// ARI is the corrected-for-chance version of the Rand Index.
/// A value of 0 indicates random clustering, 1 indicates perfect agreement.
/// Label permutations do not matter.
///
/// # Example
///
/// ```rust
/// use spectra::metrics::ari;
///
/// let pred = [1, 1, 0, 0];
/// let truth = [0, 0, 1, 1];
/// assert_eq!(ari(&pred, &truth), 1.0);
/// ```
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n = pred.len();
    let joint = build_contingency_table(pred, truth);

    // Row sums (a_i) and column sums (b_j)
    let mut row_sums = HashMap::new();
    let mut col_sums = HashMap::new();

    for (&(p, t), &count) in &joint {
        *row_sums.entry(p).or_insert(0usize) += count;
        *col_sums.entry(t).or_insert(0usize) += count;
    }

    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = row_sums.values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = col_sums.values().map(|&b| comb2(b) as f64).sum();

    let comb_n = comb2(n) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0; // Perfect agreement when both clusterings are identical
    }

    (sum_comb_ij - expected) / denom
}

/// Mean silhouette coefficient over all rows.
///
/// For row `i` with mean intra-cluster distance `a` and smallest mean
/// distance `b` to another cluster, `s = (b − a) / max(a, b)`. Rows alone in
/// their cluster score 0. Distances are Euclidean.
///
/// # Errors
///
/// - [`Error::EmptyInput`] for zero rows.
/// - [`Error::DimensionMismatch`] when `labels` and rows disagree in length.
/// - [`Error::InvalidClusterCount`] with fewer than 2 distinct labels.
pub fn silhouette_score(data: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    let clusters = cluster_members(data, labels)?;
    let n = data.nrows();

    let mut total = 0.0;
    for i in 0..n {
        let own = labels[i];
        let xi = data.row(i);

        let mut a = None;
        let mut b = f64::INFINITY;
        for (&label, members) in &clusters {
            let sum: f64 = members
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| squared_distance(&xi, &data.row(j)).sqrt())
                .sum();
            if label == own {
                let others = members.len() - 1;
                if others > 0 {
                    a = Some(sum / others as f64);
                }
            } else {
                b = b.min(sum / members.len() as f64);
            }
        }

        let Some(a) = a else { continue };
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Ok(total / n as f64)
}

/// Calinski-Harabasz score (variance ratio criterion).
///
/// ```text
/// CH = (BSS / (k − 1)) / (WSS / (n − k))
/// ```
///
/// Zero within-cluster dispersion gives `f64::INFINITY`.
///
/// # Errors
///
/// As [`silhouette_score`], plus [`Error::InvalidClusterCount`] when every
/// row forms its own cluster.
pub fn calinski_harabasz(data: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    let clusters = cluster_members(data, labels)?;
    let n = data.nrows();
    let k = clusters.len();
    if k >= n {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }

    let global = column_mean(data, &(0..n).collect::<Vec<_>>());
    let mut within = 0.0;
    let mut between = 0.0;
    for members in clusters.values() {
        let centroid = column_mean(data, members);
        within += members
            .iter()
            .map(|&i| squared_distance(&data.row(i), &centroid.view()))
            .sum::<f64>();
        between += members.len() as f64 * squared_distance(&centroid.view(), &global.view());
    }

    if within == 0.0 {
        return Ok(f64::INFINITY);
    }
    Ok((between / (k - 1) as f64) / (within / (n - k) as f64))
}

/// Davies-Bouldin index: mean over clusters of the worst similarity ratio.
///
/// ```text
/// R_ij = (s_i + s_j) / ‖c_i − c_j‖     DB = mean_i max_{j≠i} R_ij
/// ```
///
/// `s_i` is the mean distance of cluster `i`'s rows to its centroid.
/// Coincident centroids give `f64::INFINITY`.
///
/// # Errors
///
/// As [`silhouette_score`].
pub fn davies_bouldin(data: &Array2<f64>, labels: &[usize]) -> Result<f64> {
    let clusters = cluster_members(data, labels)?;
    let k = clusters.len();

    let mut centroids = Vec::with_capacity(k);
    let mut scatter = Vec::with_capacity(k);
    for members in clusters.values() {
        let centroid = column_mean(data, members);
        let s = members
            .iter()
            .map(|&i| squared_distance(&data.row(i), &centroid.view()).sqrt())
            .sum::<f64>()
            / members.len() as f64;
        centroids.push(centroid);
        scatter.push(s);
    }

    let mut total = 0.0;
    for i in 0..k {
        let mut worst = 0.0f64;
        for j in 0..k {
            if i == j {
                continue;
            }
            let d = squared_distance(&centroids[i].view(), &centroids[j].view()).sqrt();
            if d == 0.0 {
                worst = f64::INFINITY;
                break;
            }
            worst = worst.max((scatter[i] + scatter[j]) / d);
        }
        total += worst;
    }

    Ok(total / k as f64)
}

// Helper functions

fn build_contingency_table(pred: &[usize], truth: &[usize]) -> HashMap<(usize, usize), usize> {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    table
}

fn label_counts(labels: &[usize]) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for &l in labels {
        *counts.entry(l).or_insert(0usize) += 1;
    }
    counts
}

fn entropy(counts: &HashMap<usize, usize>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Rows of every cluster, keyed by label in ascending order.
fn cluster_members(data: &Array2<f64>, labels: &[usize]) -> Result<BTreeMap<usize, Vec<usize>>> {
    let n = data.nrows();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if labels.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: labels.len(),
        });
    }
    let mut clusters: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &l) in labels.iter().enumerate() {
        clusters.entry(l).or_default().push(i);
    }
    if clusters.len() < 2 {
        return Err(Error::InvalidClusterCount {
            requested: clusters.len(),
            n_items: n,
        });
    }
    Ok(clusters)
}

fn column_mean(data: &Array2<f64>, rows: &[usize]) -> Array1<f64> {
    let mut mean = Array1::zeros(data.ncols());
    for &i in rows {
        mean += &data.row(i);
    }
    mean / rows.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_nmi_perfect() {
        let pred = [0, 0, 1, 1, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_nmi_permuted() {
        // Same clustering, different labels
        let pred = [1, 1, 0, 0, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_ari_perfect() {
        let pred = [0, 0, 1, 1];
        let truth = [0, 0, 1, 1];
        assert!((ari(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_ari_independent_is_near_zero() {
        let pred = [0, 1, 0, 1, 0, 1, 0, 1];
        let truth = [0, 0, 1, 1, 0, 0, 1, 1];
        assert!(ari(&pred, &truth).abs() < 0.2);
    }

    #[test]
    fn test_ari_mismatched_lengths() {
        assert_eq!(ari(&[0, 1], &[0]), 0.0);
        assert_eq!(nmi(&[], &[]), 0.0);
    }

    #[test]
    fn test_calinski_harabasz_known_value() {
        let x = array![[1.0, 2.0], [1.0, 4.0], [1.0, 0.0], [4.0, 2.0], [4.0, 4.0], [4.0, 0.0]];
        let score = calinski_harabasz(&x, &[0, 0, 0, 1, 1, 1]).unwrap();
        assert_relative_eq!(score, 3.375, epsilon = 1e-12);
    }

    #[test]
    fn test_calinski_harabasz_rejects_singletons() {
        let x = array![[0.0], [1.0]];
        assert!(matches!(
            calinski_harabasz(&x, &[0, 1]),
            Err(Error::InvalidClusterCount { .. })
        ));
    }

    #[test]
    fn test_davies_bouldin_two_squares() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [5.0, 5.0],
            [5.0, 6.0],
            [6.0, 5.0],
            [6.0, 6.0]
        ];
        let score = davies_bouldin(&x, &[0, 0, 0, 0, 1, 1, 1, 1]).unwrap();
        assert_relative_eq!(score, 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_davies_bouldin_coincident_centroids() {
        let x = array![
            [-1.0, 0.0],
            [1.0, 0.0],
            [0.0, -1.0],
            [0.0, 1.0],
            [-0.5, 0.0],
            [0.5, 0.0],
            [0.0, -0.5],
            [0.0, 0.5]
        ];
        let score = davies_bouldin(&x, &[0, 0, 0, 0, 1, 1, 1, 1]).unwrap();
        assert_eq!(score, f64::INFINITY);
    }

    #[test]
    fn test_silhouette_well_separated() {
        let x = array![[0.0, 0.0], [0.0, 0.1], [100.0, 100.0], [100.0, 100.1]];
        let score = silhouette_score(&x, &[0, 0, 1, 1]).unwrap();
        assert!(score > 0.99);
    }

    #[test]
    fn test_silhouette_hand_computed() {
        // Points on a line: {0, 1} and {4}. Singleton scores 0.
        let x = array![[0.0], [1.0], [4.0]];
        let score = silhouette_score(&x, &[0, 0, 1]).unwrap();
        // s0 = (4 - 1) / 4, s1 = (3 - 1) / 3
        assert_relative_eq!(score, (0.75 + 2.0 / 3.0) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_internal_metrics_reject_bad_labels() {
        let x = array![[0.0], [1.0], [2.0]];
        assert!(matches!(
            silhouette_score(&x, &[0, 0, 0]),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(matches!(
            davies_bouldin(&x, &[0, 1]),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            calinski_harabasz(&Array2::zeros((0, 1)), &[]),
            Err(Error::EmptyInput)
        ));
    }
}
