//! Clustering result

use serde::Serialize;

use crate::stats::{PruneStats, StageTimings};

/// Final state of a clustering run
#[derive(Debug, Clone, Serialize)]
pub struct ClusterResult {
    /// Final centroids, K x D row-major
    pub centroids: Vec<f32>,
    /// Cluster index per point
    pub assignments: Vec<u32>,
    /// Dimensionality
    pub dim: usize,
    /// Cluster count
    pub k: usize,
    /// Steady iterations actually run
    pub iterations: usize,
    /// Buffers from the last iteration, if requested
    pub diagnostics: Option<Diagnostics>,
    /// Wall time per stage
    pub timings: StageTimings,
    /// Distance computation counters
    pub prune: PruneStats,
    /// Elapsed time in milliseconds, setup included
    pub elapsed_ms: f64,
}

/// Per-cluster buffers as left by the last iteration
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    /// K x K pairwise center distances, from the last Cluster-Distance run
    pub center_distances: Vec<f32>,
    /// Half distance to the nearest other center (+inf when K = 1)
    pub half_nearest: Vec<f32>,
    /// Movement of each center in the last Centroid Update
    pub movement: Vec<f32>,
    /// Membership changes seen by the last Refinement
    pub changed: Vec<bool>,
}

impl ClusterResult {
    pub fn centroid(&self, c: usize) -> &[f32] {
        &self.centroids[c * self.dim..(c + 1) * self.dim]
    }

    /// Centroids as a D x K matrix (one column per cluster)
    pub fn centroids_columns(&self) -> Vec<f32> {
        let mut out = vec![0.0f32; self.k * self.dim];
        for c in 0..self.k {
            for j in 0..self.dim {
                out[j * self.k + c] = self.centroids[c * self.dim + j];
            }
        }
        out
    }

    /// Number of points assigned to each cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.k];
        for &a in &self.assignments {
            sizes[a as usize] += 1;
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClusterResult {
        ClusterResult {
            centroids: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            assignments: vec![0, 1, 1],
            dim: 3,
            k: 2,
            iterations: 1,
            diagnostics: None,
            timings: StageTimings::default(),
            prune: PruneStats::default(),
            elapsed_ms: 0.0,
        }
    }

    #[test]
    fn test_centroids_columns() {
        let r = sample();
        assert_eq!(r.centroid(1), &[4.0, 5.0, 6.0]);
        assert_eq!(r.centroids_columns(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_cluster_sizes() {
        assert_eq!(sample().cluster_sizes(), vec![1, 2]);
    }
}
