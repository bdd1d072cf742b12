//! Centroid Update stage
//!
//! Each center becomes the mean of the points currently assigned to it.
//! Per-cluster sums and counts are accumulated with a rayon fold/reduce:
//! every worker owns a private accumulator and the partials are merged
//! pairwise, so no two threads ever add into the same slot. Sums are kept
//! in f64.

use rayon::prelude::*;

use crate::dataset::Dataset;
use crate::simd::l2_distance;

/// Points per fold task; keeps the number of private accumulators bounded.
const MIN_POINTS_PER_TASK: usize = 1024;

/// Write the new centers into `next` and each center's movement into
/// `movement`. A cluster with no points keeps its previous center and gets
/// a movement of exactly zero.
///
/// Returns the number of empty clusters.
pub fn update_centroids(
    points: &Dataset,
    assignment: &[u32],
    prev: &[f32],
    next: &mut [f32],
    movement: &mut [f32],
) -> usize {
    let dim = points.dim();
    let k = movement.len();
    debug_assert_eq!(prev.len(), k * dim);
    debug_assert_eq!(next.len(), k * dim);

    let (sums, counts) = (0..points.num_vectors())
        .into_par_iter()
        .with_min_len(MIN_POINTS_PER_TASK)
        .fold(
            || (vec![0.0f64; k * dim], vec![0u64; k]),
            |(mut sums, mut counts), p| {
                let c = assignment[p] as usize;
                let acc = &mut sums[c * dim..(c + 1) * dim];
                for (s, &v) in acc.iter_mut().zip(points.vector(p)) {
                    *s += v as f64;
                }
                counts[c] += 1;
                (sums, counts)
            },
        )
        .reduce(
            || (vec![0.0f64; k * dim], vec![0u64; k]),
            |(mut left_sums, mut left_counts), (right_sums, right_counts)| {
                for (l, r) in left_sums.iter_mut().zip(right_sums.iter()) {
                    *l += r;
                }
                for (l, r) in left_counts.iter_mut().zip(right_counts.iter()) {
                    *l += r;
                }
                (left_sums, left_counts)
            },
        );

    next.par_chunks_mut(dim)
        .zip(movement.par_iter_mut())
        .enumerate()
        .for_each(|(c, (center, moved))| {
            let old = &prev[c * dim..(c + 1) * dim];
            let count = counts[c];
            if count == 0 {
                center.copy_from_slice(old);
                *moved = 0.0;
                return;
            }
            let inv = 1.0 / count as f64;
            for (dst, &s) in center.iter_mut().zip(&sums[c * dim..(c + 1) * dim]) {
                *dst = (s * inv) as f32;
            }
            *moved = l2_distance(old, center);
        });

    counts.iter().filter(|&&n| n == 0).count()
}
