//! Assignment Refinement stage
//!
//! For each point, exact distances are computed only for candidate centers
//! that the triangle inequality cannot rule out. A candidate `c` is skipped
//! when any of these bounds exceeds the (exact) upper bound `u` of the
//! currently assigned center `a`:
//!
//! - `half_nearest[a]`: every other center is at least `2 * half_nearest[a]`
//!   from `a`, so it is farther than `u` from the point
//! - `lower[c]`
//! - `center_dist[a][c] / 2`
//!
//! A bound equal to `u` only rules out `c > a`: ties go to the lowest
//! index, so a candidate below `a` at distance exactly `u` is still checked.
//!
//! Centers have not moved since the last Bound Maintenance, so lower
//! bounds that are skipped stay valid as they are.

use rayon::prelude::*;

use super::buffers::{Bounds, CenterDistances};
use crate::atomic_utils::{AtomicFlags, PruneCounters};
use crate::dataset::Dataset;
use crate::simd::l2_distance;

pub fn refine_assignments(
    points: &Dataset,
    centroids: &[f32],
    centers: &CenterDistances,
    bounds: &mut Bounds,
    changed: &AtomicFlags,
    counters: &PruneCounters,
) {
    let k = bounds.k();
    let dim = points.dim();
    let center = |c: usize| &centroids[c * dim..(c + 1) * dim];

    bounds
        .assignment
        .par_iter_mut()
        .zip(bounds.upper.par_iter_mut())
        .zip(bounds.stale.par_iter_mut())
        .zip(bounds.lower.par_chunks_mut(k))
        .enumerate()
        .for_each(|(p, (((assign, upper), stale), lower))| {
            let x = points.vector(p);
            let original = *assign as usize;
            let mut a = original;
            let mut computed = 0u64;
            let mut pruned = 0u64;

            // a stale upper bound is safe but not exact; tighten it before
            // it is used as the comparison basis
            if *stale {
                let d = l2_distance(x, center(a));
                *upper = d;
                lower[a] = d;
                *stale = false;
                computed += 1;
            }

            for c in 0..k {
                if c == a {
                    continue;
                }
                let u = *upper;
                let excludes = |bound: f32| bound > u || (bound == u && c > a);
                if excludes(centers.half_nearest(a))
                    || excludes(lower[c])
                    || excludes(0.5 * centers.get(a, c))
                {
                    pruned += 1;
                    continue;
                }

                let d = l2_distance(x, center(c));
                computed += 1;
                lower[c] = d;
                if d < u || (d == u && c < a) {
                    a = c;
                    *upper = d;
                }
            }

            if a != original {
                *assign = a as u32;
                changed.set(original);
                changed.set(a);
            }
            counters.computed.add(computed);
            counters.pruned.add(pruned);
        });
}
