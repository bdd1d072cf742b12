//! Engine buffers
//!
//! Allocated once per run and updated in place by the stages.

/// Double-buffered centroids, K x D row-major each.
///
/// Stages read `current` and write `next`; the driver swaps them between
/// iterations, so no stage ever reads and writes the same buffer.
#[derive(Debug, Clone)]
pub struct CentroidBuffers {
    buffers: [Vec<f32>; 2],
    current: usize,
    dim: usize,
    k: usize,
}

impl CentroidBuffers {
    pub fn new(initial: Vec<f32>, dim: usize) -> Self {
        let k = initial.len() / dim;
        let next = initial.clone();
        Self {
            buffers: [initial, next],
            current: 0,
            dim,
            k,
        }
    }

    pub fn current(&self) -> &[f32] {
        &self.buffers[self.current]
    }

    pub fn centroid(&self, c: usize) -> &[f32] {
        &self.current()[c * self.dim..(c + 1) * self.dim]
    }

    /// Borrow (current, next) for a Centroid Update
    pub fn split(&mut self) -> (&[f32], &mut [f32]) {
        let (first, second) = self.buffers.split_at_mut(1);
        if self.current == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        }
    }

    /// Make `next` the current buffer
    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    pub fn into_current(self) -> Vec<f32> {
        let [a, b] = self.buffers;
        if self.current == 0 {
            a
        } else {
            b
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

/// Per-point assignment and distance bounds.
///
/// Lower bounds are stored point-major (N x K) so that one point's K
/// bounds form a contiguous chunk a single worker can own mutably.
/// `lower_bound(c, p)` gives the K x N view.
#[derive(Debug, Clone)]
pub struct Bounds {
    pub(crate) assignment: Vec<u32>,
    pub(crate) lower: Vec<f32>,
    pub(crate) upper: Vec<f32>,
    pub(crate) stale: Vec<bool>,
    k: usize,
}

impl Bounds {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            assignment: vec![0; n],
            lower: vec![0.0; n * k],
            upper: vec![0.0; n],
            stale: vec![false; n],
            k,
        }
    }

    pub fn num_points(&self) -> usize {
        self.assignment.len()
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn assignment(&self, p: usize) -> usize {
        self.assignment[p] as usize
    }

    pub fn assignments(&self) -> &[u32] {
        &self.assignment
    }

    #[inline]
    pub fn lower_bound(&self, c: usize, p: usize) -> f32 {
        self.lower[p * self.k + c]
    }

    pub fn upper_bound(&self, p: usize) -> f32 {
        self.upper[p]
    }

    pub fn is_stale(&self, p: usize) -> bool {
        self.stale[p]
    }

    /// Lower bounds as a K x N matrix (row per cluster)
    pub fn lower_bounds_by_cluster(&self) -> Vec<f32> {
        let n = self.num_points();
        let mut out = vec![0.0f32; n * self.k];
        for p in 0..n {
            for c in 0..self.k {
                out[c * n + p] = self.lower[p * self.k + c];
            }
        }
        out
    }
}

/// Pairwise center distances and the half distance to the nearest other
/// center, as produced by the Cluster-Distance stage.
#[derive(Debug, Clone)]
pub struct CenterDistances {
    pub(crate) dist: Vec<f32>,
    pub(crate) half_nearest: Vec<f32>,
    k: usize,
}

impl CenterDistances {
    pub fn new(k: usize) -> Self {
        Self {
            dist: vec![0.0; k * k],
            half_nearest: vec![f32::INFINITY; k],
            k,
        }
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.dist[i * self.k + j]
    }

    pub fn half_nearest(&self, i: usize) -> f32 {
        self.half_nearest[i]
    }

    pub fn matrix(&self) -> &[f32] {
        &self.dist
    }

    pub fn half_nearest_all(&self) -> &[f32] {
        &self.half_nearest
    }

    pub fn k(&self) -> usize {
        self.k
    }
}
