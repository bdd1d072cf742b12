//! Cluster-Distance stage
//!
//! Pairwise center distances (K x K, symmetric, zero diagonal) and, per
//! center, half the distance to its nearest other center.

use rayon::prelude::*;

use super::buffers::CenterDistances;
use crate::simd::l2_distance;

/// Recompute `out` from the current centroids (K x D row-major).
///
/// Each unordered pair is computed once. With K = 1 the half-nearest
/// distance stays at +inf.
pub fn compute_center_distances(centroids: &[f32], dim: usize, out: &mut CenterDistances) {
    let k = out.k();
    debug_assert_eq!(centroids.len(), k * dim);
    let center = |c: usize| &centroids[c * dim..(c + 1) * dim];

    // row i holds d(i, j) for j > i
    let upper: Vec<Vec<f32>> = (0..k)
        .into_par_iter()
        .map(|i| ((i + 1)..k).map(|j| l2_distance(center(i), center(j))).collect())
        .collect();

    for (i, row) in upper.iter().enumerate() {
        out.dist[i * k + i] = 0.0;
        for (offset, &d) in row.iter().enumerate() {
            let j = i + 1 + offset;
            out.dist[i * k + j] = d;
            out.dist[j * k + i] = d;
        }
    }

    let dist = &out.dist;
    out.half_nearest
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, h)| {
            let nearest = (0..k)
                .filter(|&j| j != i)
                .map(|j| dist[i * k + j])
                .fold(f32::INFINITY, f32::min);
            *h = 0.5 * nearest;
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_distances() {
        // three centers on a line: 0, 3, 10
        let centroids = vec![0.0, 0.0, 3.0, 0.0, 10.0, 0.0];
        let mut out = CenterDistances::new(3);
        compute_center_distances(&centroids, 2, &mut out);

        assert_eq!(out.get(0, 0), 0.0);
        assert!((out.get(0, 1) - 3.0).abs() < 1e-6);
        assert!((out.get(2, 0) - 10.0).abs() < 1e-6);
        assert_eq!(out.get(1, 2), out.get(2, 1));

        assert!((out.half_nearest(0) - 1.5).abs() < 1e-6);
        assert!((out.half_nearest(1) - 1.5).abs() < 1e-6);
        assert!((out.half_nearest(2) - 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_single_cluster_is_infinite() {
        let mut out = CenterDistances::new(1);
        compute_center_distances(&[1.0, 2.0, 3.0], 3, &mut out);
        assert_eq!(out.get(0, 0), 0.0);
        assert_eq!(out.half_nearest(0), f32::INFINITY);
    }

    #[test]
    fn test_duplicate_centers() {
        let centroids = vec![1.0, 1.0, 1.0, 1.0, 4.0, 5.0];
        let mut out = CenterDistances::new(3);
        compute_center_distances(&centroids, 2, &mut out);
        assert_eq!(out.get(0, 1), 0.0);
        assert_eq!(out.half_nearest(0), 0.0);
        assert!((out.half_nearest(2) - 2.5).abs() < 1e-6);
    }
}
