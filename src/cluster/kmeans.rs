//! K-means clustering.
//!
//! Partitions rows into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS, the *inertia*):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids (k-means++ or distinct random rows)
//! 2. **Assign**: each row → nearest centroid (ties → lowest centroid index)
//! 3. **Reseed**: every empty cluster takes the farthest row of a cluster
//!    that can spare one
//! 4. **Update**: each centroid → mean of its rows
//! 5. Repeat until no assignment changes or `max_iter` runs out
//!
//! Every step either lowers WCSS or leaves it unchanged, so the per-iteration
//! inertia history is non-increasing.
//!
//! # Restarts
//!
//! Lloyd finds a local minimum only. `n_init` independent runs are made and
//! the one with the lowest final inertia wins (ties → lowest restart index).
//! Restart `r` is seeded with `seed + r`, so results do not depend on the
//! order in which restarts execute.

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::graph::squared_distance;
use ndarray::{Array2, ArrayView2};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// How initial centroids are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InitStrategy {
    /// D²-weighted seeding (Arthur and Vassilvitskii).
    #[default]
    KMeansPlusPlus,
    /// k distinct rows, uniformly at random.
    Random,
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum Lloyd iterations per restart.
    max_iter: usize,
    /// Number of restarts.
    n_init: usize,
    /// Initialization strategy.
    init: InitStrategy,
    /// Base random seed.
    seed: Option<u64>,
}

/// Result of a k-means fit: the best restart plus per-restart diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster of every row, in `[0, k)`.
    pub labels: Vec<usize>,
    /// Final centroids (`k × d`).
    pub centers: Array2<f64>,
    /// Sum of squared distances of rows to their assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations of the best restart.
    pub n_iter: usize,
    /// Whether the best restart stopped because assignments stabilized.
    pub converged: bool,
    /// Inertia after every iteration of the best restart.
    pub inertia_history: Vec<f64>,
    /// Final inertia of every restart, in restart order.
    pub restart_inertias: Vec<f64>,
}

#[derive(Debug)]
struct Run {
    labels: Vec<usize>,
    centers: Array2<f64>,
    inertia: f64,
    n_iter: usize,
    converged: bool,
    inertia_history: Vec<f64>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            n_init: 10,
            init: InitStrategy::KMeansPlusPlus,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the initialization strategy.
    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cluster the rows of `data`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyInput`] for zero rows.
    /// - [`Error::InvalidClusterCount`] when `k == 0` or `k > n`.
    /// - [`Error::InvalidParameter`] for `n_init == 0`, `max_iter == 0`, or
    ///   non-finite data.
    pub fn fit(&self, data: &Array2<f64>) -> Result<KmeansFit> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "data",
                message: "must contain only finite values",
            });
        }

        let base_seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let view = data.view();

        #[cfg(feature = "parallel")]
        let runs: Vec<Run> = (0..self.n_init)
            .into_par_iter()
            .map(|r| self.run_once(view, base_seed.wrapping_add(r as u64)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let runs: Vec<Run> = (0..self.n_init)
            .map(|r| self.run_once(view, base_seed.wrapping_add(r as u64)))
            .collect();

        let restart_inertias: Vec<f64> = runs.iter().map(|r| r.inertia).collect();
        let mut best_idx = 0;
        for (r, &inertia) in restart_inertias.iter().enumerate() {
            if inertia < restart_inertias[best_idx] {
                best_idx = r;
            }
        }

        let best = runs.into_iter().nth(best_idx).ok_or(Error::EmptyInput)?;
        if !best.converged {
            log::warn!(
                "kmeans: best restart did not converge within {} iterations",
                self.max_iter
            );
        }
        log::debug!(
            "kmeans: k={}, n={n}, best restart {best_idx} of {} (inertia={:.6e}, iters={})",
            self.k,
            self.n_init,
            best.inertia,
            best.n_iter
        );

        Ok(KmeansFit {
            labels: best.labels,
            centers: best.centers,
            inertia: best.inertia,
            n_iter: best.n_iter,
            converged: best.converged,
            inertia_history: best.inertia_history,
            restart_inertias,
        })
    }

    /// One full Lloyd run with its own RNG and buffers.
    fn run_once(&self, data: ArrayView2<'_, f64>, seed: u64) -> Run {
        let n = data.nrows();
        let d = data.ncols();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut centers = match self.init {
            InitStrategy::KMeansPlusPlus => kmeans_plus_plus(data, self.k, &mut rng),
            InitStrategy::Random => random_init(data, self.k, &mut rng),
        };

        let mut labels = vec![usize::MAX; n];
        let mut dist = vec![0.0f64; n];
        let mut counts = vec![0usize; self.k];
        let mut inertia_history = Vec::new();
        let mut converged = false;
        let mut n_iter = 0;
        let mut inertia = f64::INFINITY;

        while n_iter < self.max_iter {
            let previous = labels.clone();

            // Assignment step
            counts.iter_mut().for_each(|c| *c = 0);
            for i in 0..n {
                let point = data.row(i);
                let mut best_cluster = 0;
                let mut best_dist = f64::INFINITY;
                for k in 0..self.k {
                    let dist_k = squared_distance(&point, &centers.row(k));
                    if dist_k < best_dist {
                        best_dist = dist_k;
                        best_cluster = k;
                    }
                }
                labels[i] = best_cluster;
                dist[i] = best_dist;
                counts[best_cluster] += 1;
            }

            reseed_empty_clusters(&mut labels, &mut dist, &mut counts);

            // Update step
            let mut new_centers = Array2::zeros((self.k, d));
            for i in 0..n {
                let mut row = new_centers.row_mut(labels[i]);
                row += &data.row(i);
            }
            for (k, mut row) in new_centers.rows_mut().into_iter().enumerate() {
                if counts[k] > 0 {
                    row /= counts[k] as f64;
                }
            }
            centers = new_centers;

            inertia = (0..n)
                .map(|i| squared_distance(&data.row(i), &centers.row(labels[i])))
                .sum();
            inertia_history.push(inertia);
            n_iter += 1;

            if labels == previous {
                converged = true;
                break;
            }
        }

        Run {
            labels,
            centers,
            inertia,
            n_iter,
            converged,
            inertia_history,
        }
    }
}

/// Fill empty clusters in ascending order.
///
/// Each empty cluster takes the row farthest from its centroid (lowest index
/// on ties) among rows whose cluster has more than one member. The moved row
/// has distance 0 to its new singleton centroid, so it is never picked twice.
fn reseed_empty_clusters(labels: &mut [usize], dist: &mut [f64], counts: &mut [usize]) {
    for cluster in 0..counts.len() {
        if counts[cluster] > 0 {
            continue;
        }
        let mut farthest: Option<usize> = None;
        for i in 0..labels.len() {
            if counts[labels[i]] <= 1 {
                continue;
            }
            match farthest {
                Some(j) if dist[i] <= dist[j] => {}
                _ => farthest = Some(i),
            }
        }
        // k <= n guarantees a donor while any cluster is empty.
        let Some(i) = farthest else { return };
        log::debug!("kmeans: reseeding empty cluster {cluster} with row {i}");
        counts[labels[i]] -= 1;
        labels[i] = cluster;
        counts[cluster] = 1;
        dist[i] = 0.0;
    }
}

/// k-means++ seeding.
///
/// First centroid uniform; each further centroid is drawn with probability
/// proportional to the squared distance to the nearest chosen centroid. When
/// every row coincides with a centroid, the lowest unchosen index is taken.
fn kmeans_plus_plus(data: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centers = Array2::zeros((k, data.ncols()));
    let mut chosen = vec![false; n];

    let first = rng.random_range(0..n);
    centers.row_mut(0).assign(&data.row(first));
    chosen[first] = true;

    let mut min_dist: Vec<f64> = (0..n)
        .map(|j| squared_distance(&data.row(j), &data.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = min_dist.iter().sum();
        let selected = if total > 0.0 {
            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = None;
            let mut last_positive = 0;
            for (j, &dj) in min_dist.iter().enumerate() {
                if dj <= 0.0 {
                    continue;
                }
                last_positive = j;
                cumsum += dj;
                if cumsum >= threshold {
                    selected = Some(j);
                    break;
                }
            }
            selected.unwrap_or(last_positive)
        } else {
            (0..n).find(|&j| !chosen[j]).unwrap_or(0)
        };

        centers.row_mut(c).assign(&data.row(selected));
        chosen[selected] = true;
        for (j, dj) in min_dist.iter_mut().enumerate() {
            let d = squared_distance(&data.row(j), &data.row(selected));
            if d < *dj {
                *dj = d;
            }
        }
    }

    centers
}

/// k distinct rows chosen uniformly.
fn random_init(data: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let mut idxs: Vec<usize> = (0..data.nrows()).collect();
    idxs.shuffle(rng);
    let mut centers = Array2::zeros((k, data.ncols()));
    for (ci, &i) in idxs.iter().take(k).enumerate() {
        centers.row_mut(ci).assign(&data.row(i));
    }
    centers
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &Array2<f64>) -> Result<Vec<usize>> {
        self.fit(data).map(|fit| fit.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashSet;

    fn four_points() -> Array2<f64> {
        array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]]
    }

    #[test]
    fn test_kmeans_basic() {
        let kmeans = Kmeans::new(2).with_seed(42);
        let labels = kmeans.fit_predict(&four_points()).unwrap();

        // Points 0,1 should be in same cluster, points 2,3 in another
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_kmeans_all_points_assigned() {
        let data = Array2::from_shape_fn((50, 2), |(i, j)| {
            if j == 0 {
                i as f64 * 0.1
            } else {
                (i % 5) as f64
            }
        });

        let fit = Kmeans::new(5).with_seed(123).fit(&data).unwrap();
        assert_eq!(fit.labels.len(), 50);
        for &label in &fit.labels {
            assert!(label < 5, "label {} out of range", label);
        }
        assert_eq!(fit.centers.dim(), (5, 2));
        assert_eq!(fit.restart_inertias.len(), 10);
    }

    #[test]
    fn test_kmeans_k_equals_n() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let fit = Kmeans::new(3).with_seed(42).fit(&data).unwrap();

        let unique: HashSet<_> = fit.labels.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn test_kmeans_deterministic_with_seed() {
        for init in [InitStrategy::KMeansPlusPlus, InitStrategy::Random] {
            let a = Kmeans::new(2).with_seed(42).with_init(init).fit(&four_points()).unwrap();
            let b = Kmeans::new(2).with_seed(42).with_init(init).fit(&four_points()).unwrap();
            assert_eq!(a, b, "same seed should give same result");
        }
    }

    #[test]
    fn test_kmeans_scaling_invariant() {
        let data = four_points();
        let scaled = &data * 100.0;

        let labels1 = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
        let labels2 = Kmeans::new(2).with_seed(42).fit_predict(&scaled).unwrap();

        // Same structure (labels may be permuted)
        assert_eq!(labels1[0], labels1[1]);
        assert_eq!(labels2[0], labels2[1]);
        assert_eq!(labels1[2], labels1[3]);
        assert_eq!(labels2[2], labels2[3]);
        assert_ne!(labels1[0], labels1[2]);
        assert_ne!(labels2[0], labels2[2]);
    }

    #[test]
    fn test_identical_points_fill_every_cluster() {
        let data = Array2::<f64>::zeros((4, 2));
        let fit = Kmeans::new(3).with_seed(7).fit(&data).unwrap();
        let unique: HashSet<_> = fit.labels.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(fit.inertia, 0.0);
        assert!(fit.converged);
    }

    #[test]
    fn test_reseed_takes_farthest_donor() {
        // Everything landed in cluster 0; clusters 1 and 2 are empty.
        let mut labels = vec![0, 0, 0, 0];
        let mut dist = vec![1.0, 9.0, 4.0, 9.0];
        let mut counts = vec![4, 0, 0];
        reseed_empty_clusters(&mut labels, &mut dist, &mut counts);
        // Row 1 wins the tie with row 3, then row 3 is next farthest.
        assert_eq!(labels, vec![0, 1, 0, 2]);
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(dist[1], 0.0);
    }

    #[test]
    fn test_reseed_never_empties_a_singleton() {
        let mut labels = vec![0, 1, 1];
        let mut dist = vec![100.0, 1.0, 2.0];
        let mut counts = vec![1, 2, 0];
        reseed_empty_clusters(&mut labels, &mut dist, &mut counts);
        assert_eq!(labels, vec![0, 1, 2]);
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn test_inertia_history_non_increasing() {
        let data = Array2::from_shape_fn((40, 2), |(i, j)| {
            ((i * 7 + j * 13) % 11) as f64 + if i < 20 { 0.0 } else { 15.0 }
        });
        let fit = Kmeans::new(4).with_seed(3).with_n_init(3).fit(&data).unwrap();
        for w in fit.inertia_history.windows(2) {
            assert!(w[1] <= w[0] + 1e-9 * w[0].max(1.0));
        }
        assert_eq!(fit.inertia, *fit.inertia_history.last().unwrap());
        let min = fit.restart_inertias.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(fit.inertia, min);
    }

    #[test]
    fn test_max_iter_is_not_an_error() {
        let data = Array2::from_shape_fn((30, 1), |(i, _)| (i * i) as f64);
        let fit = Kmeans::new(3).with_seed(1).with_max_iter(1).fit(&data).unwrap();
        assert_eq!(fit.n_iter, 1);
        assert_eq!(fit.inertia_history.len(), 1);
    }

    #[test]
    fn test_kmeans_empty_input_error() {
        let data = Array2::<f64>::zeros((0, 2));
        assert!(matches!(Kmeans::new(2).fit(&data), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_kmeans_invalid_cluster_counts() {
        let data = array![[0.0, 0.0], [1.0, 1.0]];
        assert!(matches!(
            Kmeans::new(5).fit(&data),
            Err(Error::InvalidClusterCount { requested: 5, n_items: 2 })
        ));
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(Error::InvalidClusterCount { .. })
        ));
    }

    #[test]
    fn test_kmeans_invalid_parameters() {
        let data = four_points();
        assert!(matches!(
            Kmeans::new(2).with_n_init(0).fit(&data),
            Err(Error::InvalidParameter { name: "n_init", .. })
        ));
        assert!(matches!(
            Kmeans::new(2).with_max_iter(0).fit(&data),
            Err(Error::InvalidParameter { name: "max_iter", .. })
        ));
    }
}
