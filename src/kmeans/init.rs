//! Bound Initialization stage
//!
//! Computes every point-to-center distance once. Lower bounds and the upper
//! bound start exact, and each point is assigned to its nearest center
//! (lowest index on ties). No pruning: there is no current nearest center
//! to prune against yet.

use rayon::prelude::*;

use super::buffers::Bounds;
use crate::atomic_utils::PruneCounters;
use crate::dataset::Dataset;
use crate::simd::l2_distance;

pub fn initialize_bounds(
    points: &Dataset,
    centroids: &[f32],
    bounds: &mut Bounds,
    counters: &PruneCounters,
) {
    let k = bounds.k();
    let dim = points.dim();

    bounds
        .assignment
        .par_iter_mut()
        .zip(bounds.upper.par_iter_mut())
        .zip(bounds.stale.par_iter_mut())
        .zip(bounds.lower.par_chunks_mut(k))
        .enumerate()
        .for_each(|(p, (((assign, upper), stale), lower))| {
            let x = points.vector(p);
            let mut best = 0usize;
            let mut best_dist = f32::INFINITY;
            for (c, lb) in lower.iter_mut().enumerate() {
                let d = l2_distance(x, &centroids[c * dim..(c + 1) * dim]);
                *lb = d;
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            *assign = best as u32;
            *upper = best_dist;
            *stale = false;
            counters.computed.add(k as u64);
        });
}
