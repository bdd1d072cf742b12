//! 参考实现：朴素 Lloyd 迭代
//!
//! Serial brute force: every point-to-center distance on every iteration.
//! Used only to check the accelerated engine.

use crate::api::{KmeansError, Result};
use crate::dataset::Dataset;
use crate::simd::l2_distance;

/// Output of [`lloyd`]
#[derive(Debug, Clone)]
pub struct ReferenceOutput {
    /// Final centroids, K x D
    pub centroids: Vec<f32>,
    /// Centroids before the last update (equal to `centroids` when no
    /// iteration ran)
    pub previous_centroids: Vec<f32>,
    /// Assignment against `previous_centroids`
    pub assignments: Vec<u32>,
}

/// 查找每个点最近的质心（相同距离取最小下标）
pub fn assign_nearest(points: &Dataset, centroids: &[f32]) -> Vec<u32> {
    let dim = points.dim();
    let k = centroids.len() / dim;
    (0..points.num_vectors())
        .map(|i| {
            let x = points.vector(i);
            let mut min_dist = f32::INFINITY;
            let mut best = 0usize;
            for c in 0..k {
                let dist = l2_distance(x, &centroids[c * dim..(c + 1) * dim]);
                if dist < min_dist {
                    min_dist = dist;
                    best = c;
                }
            }
            best as u32
        })
        .collect()
}

/// 更新质心为所属点的均值；空聚类保持原质心
pub fn update_means(points: &Dataset, assignments: &[u32], centroids: &[f32]) -> Vec<f32> {
    let dim = points.dim();
    let k = centroids.len() / dim;
    let mut sums = vec![0.0f64; k * dim];
    let mut counts = vec![0usize; k];

    for (i, &a) in assignments.iter().enumerate() {
        let c = a as usize;
        for (s, &v) in sums[c * dim..(c + 1) * dim].iter_mut().zip(points.vector(i)) {
            *s += v as f64;
        }
        counts[c] += 1;
    }

    let mut out = centroids.to_vec();
    for c in 0..k {
        if counts[c] > 0 {
            for j in 0..dim {
                out[c * dim + j] = (sums[c * dim + j] / counts[c] as f64) as f32;
            }
        }
    }
    out
}

/// Run `iterations` Lloyd iterations from `centroids`.
///
/// The assignment returned is the one used for the last update, matching
/// the engine's output.
pub fn lloyd(points: &Dataset, centroids: &Dataset, iterations: usize) -> Result<ReferenceOutput> {
    if points.dim() != centroids.dim() {
        return Err(KmeansError::DimensionMismatch {
            points: points.dim(),
            centroids: centroids.dim(),
        });
    }
    let k = centroids.num_vectors();
    if k == 0 || k > points.num_vectors() {
        return Err(KmeansError::InvalidClusterCount {
            k,
            n: points.num_vectors(),
        });
    }

    let mut current = centroids.vectors().to_vec();
    let mut previous = current.clone();
    let mut assignments = assign_nearest(points, &current);

    for iter in 0..iterations {
        if iter > 0 {
            assignments = assign_nearest(points, &current);
        }
        let next = update_means(points, &assignments, &current);
        previous = std::mem::replace(&mut current, next);
    }

    Ok(ReferenceOutput {
        centroids: current,
        previous_centroids: previous,
        assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_nearest() {
        let points = Dataset::from_vectors(vec![0.0, 4.0, 6.0, 10.0], 1).unwrap();
        assert_eq!(assign_nearest(&points, &[1.0, 9.0]), vec![0, 0, 1, 1]);
        // tie at 5.0 goes to the lower index
        let tie = Dataset::from_vectors(vec![5.0], 1).unwrap();
        assert_eq!(assign_nearest(&tie, &[4.0, 6.0]), vec![0]);
    }

    #[test]
    fn test_update_means_empty_cluster() {
        let points = Dataset::from_vectors(vec![1.0, 3.0], 1).unwrap();
        let out = update_means(&points, &[0, 0], &[0.0, 100.0]);
        assert_eq!(out, vec![2.0, 100.0]);
    }

    #[test]
    fn test_lloyd_converges() {
        let points = Dataset::from_vectors(
            vec![0.0, 0.0, 0.1, 0.1, 0.2, 0.0, 10.0, 10.0, 10.1, 10.1, 10.2, 10.0],
            2,
        )
        .unwrap();
        let centroids = Dataset::from_vectors(vec![0.0, 0.0, 1.0, 1.0], 2).unwrap();
        let out = lloyd(&points, &centroids, 5).unwrap();
        assert_eq!(out.assignments, vec![0, 0, 0, 1, 1, 1]);
        assert!((out.centroids[2] - 10.1).abs() < 1e-5);
        assert!((out.centroids[3] - 10.033333).abs() < 1e-5);
    }

    #[test]
    fn test_lloyd_zero_iterations() {
        let points = Dataset::from_vectors(vec![0.0, 10.0], 1).unwrap();
        let centroids = Dataset::from_vectors(vec![1.0, 2.0], 1).unwrap();
        let out = lloyd(&points, &centroids, 0).unwrap();
        assert_eq!(out.centroids, vec![1.0, 2.0]);
        assert_eq!(out.previous_centroids, out.centroids);
        assert_eq!(out.assignments, vec![0, 1]);
    }
}
