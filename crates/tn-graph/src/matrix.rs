//! Dense all-pairs travel-time matrix.
//!
//! Row-major `f64` storage: cell `(i, j)` lives at `data[i * dim + j]` and
//! holds the shortest travel time in seconds from node `i` to node `j`, or
//! `f64::INFINITY` when `j` is unreachable from `i`.  Memory is O(N²); at
//! 5,000 nodes that is 200 MB, which is why pruning runs before anything
//! else touches the matrix.

use tn_core::NodeIdx;

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    dim:  usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// A `dim × dim` matrix with every cell unreachable.
    pub fn unreachable(dim: usize) -> Self {
        Self { dim, data: vec![f64::INFINITY; dim * dim] }
    }

    /// Wrap row-major data.  Returns `None` if `data.len() != dim * dim`.
    pub fn from_row_major(dim: usize, data: Vec<f64>) -> Option<Self> {
        (data.len() == dim * dim).then_some(Self { dim, data })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, from: NodeIdx, to: NodeIdx) -> f64 {
        self.data[from.index() * self.dim + to.index()]
    }

    #[inline]
    pub fn row(&self, from: NodeIdx) -> &[f64] {
        let start = from.index() * self.dim;
        &self.data[start..start + self.dim]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable row-major storage, for engines that fill rows in place.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Number of unreachable destinations in row `i`.
    pub fn unreachable_in_row(&self, i: usize) -> usize {
        let start = i * self.dim;
        self.data[start..start + self.dim]
            .iter()
            .filter(|d| d.is_infinite())
            .count()
    }

    /// Number of unreachable sources in column `j`.
    pub fn unreachable_in_col(&self, j: usize) -> usize {
        (0..self.dim)
            .filter(|&i| self.data[i * self.dim + j].is_infinite())
            .count()
    }

    /// Keep only the rows *and* columns listed in `keep` (ascending), in that
    /// order.
    pub fn select(&self, keep: &[usize]) -> DistanceMatrix {
        let dim = keep.len();
        let mut data = Vec::with_capacity(dim * dim);
        for &i in keep {
            let row = &self.data[i * self.dim..(i + 1) * self.dim];
            data.extend(keep.iter().map(|&j| row[j]));
        }
        DistanceMatrix { dim, data }
    }
}
