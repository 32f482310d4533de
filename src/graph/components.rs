//! Connected components of an affinity graph.
//!
//! The multiplicity of the Laplacian's zero eigenvalue equals the number of
//! components that contain at least one edge. Counting them by traversal is
//! exact, whereas counting near-zero eigenvalues depends on a tolerance.

use super::affinity::AffinityMatrix;
use ndarray::Array2;
use petgraph::unionfind::UnionFind;

/// Component labelling of the vertices `0..n`.
///
/// Component ids are canonical: component `c` is the `c`-th distinct
/// component met when scanning vertices in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    labels: Vec<usize>,
    sizes: Vec<usize>,
}

impl Components {
    /// Components of the graph with an edge wherever `A[i][j] > 0`, `i ≠ j`.
    pub fn from_affinity(affinity: &AffinityMatrix) -> Self {
        let mut uf = UnionFind::new(affinity.n());
        affinity.for_each_edge(|i, j, _| {
            uf.union(i, j);
        });
        Self::from_union_find(uf)
    }

    /// Components of the graph given by the non-zero off-diagonal pattern of `L`.
    pub fn from_laplacian(laplacian: &Array2<f64>) -> Self {
        let n = laplacian.nrows();
        let mut uf = UnionFind::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                if laplacian[[i, j]] != 0.0 {
                    uf.union(i, j);
                }
            }
        }
        Self::from_union_find(uf)
    }

    fn from_union_find(uf: UnionFind<usize>) -> Self {
        let roots = uf.into_labeling();
        let mut remap = vec![usize::MAX; roots.len()];
        let mut labels = Vec::with_capacity(roots.len());
        let mut sizes: Vec<usize> = Vec::new();
        for root in roots {
            if remap[root] == usize::MAX {
                remap[root] = sizes.len();
                sizes.push(0);
            }
            let id = remap[root];
            sizes[id] += 1;
            labels.push(id);
        }
        Self { labels, sizes }
    }

    /// Component id of every vertex.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Vertex count of every component.
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Total number of components, singletons included.
    pub fn n_components(&self) -> usize {
        self.sizes.len()
    }

    /// Components with at least two vertices, in canonical order.
    ///
    /// Singletons are isolated vertices: their Laplacian row is the identity
    /// row, so they carry eigenvalue 1 rather than 0.
    pub fn null_space_components(&self) -> Vec<usize> {
        (0..self.sizes.len())
            .filter(|&c| self.sizes[c] >= 2)
            .collect()
    }

    /// Vertices belonging to component `c`, ascending.
    pub fn members(&self, c: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == c)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_two_components_and_isolated_vertex() {
        let a = AffinityMatrix::precomputed(&array![
            [0.0, 1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 2.0],
            [0.0, 0.0, 0.0, 2.0, 0.0],
        ])
        .unwrap();
        let c = Components::from_affinity(&a);
        assert_eq!(c.labels(), &[0, 0, 1, 2, 2]);
        assert_eq!(c.sizes(), &[2, 1, 2]);
        assert_eq!(c.n_components(), 3);
        assert_eq!(c.null_space_components(), vec![0, 2]);
        assert_eq!(c.members(2), vec![3, 4]);
    }

    #[test]
    fn test_self_loops_do_not_connect() {
        let a = AffinityMatrix::precomputed(&array![[1.0, 0.0], [0.0, 1.0]]).unwrap();
        let c = Components::from_affinity(&a);
        assert_eq!(c.n_components(), 2);
        assert!(c.null_space_components().is_empty());
    }

    #[test]
    fn test_laplacian_pattern_matches_affinity() {
        let a = array![[0.0, 0.3, 0.0], [0.3, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let l = array![[1.0, -1.0, 0.0], [-1.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let from_a = Components::from_affinity(&AffinityMatrix::precomputed(&a).unwrap());
        let from_l = Components::from_laplacian(&l);
        assert_eq!(from_a, from_l);
    }
}
