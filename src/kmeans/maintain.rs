//! Bound Maintenance stage
//!
//! After centers move by `movement[c]`, the triangle inequality gives
//! `d(p, c_new) >= d(p, c_old) - movement[c]` and
//! `d(p, c_new) <= d(p, c_old) + movement[c]`, so lower bounds shrink and
//! the upper bound grows by the movement of the matching center.

use rayon::prelude::*;

use super::buffers::Bounds;

pub fn widen_bounds(movement: &[f32], bounds: &mut Bounds) {
    let k = bounds.k();
    debug_assert_eq!(movement.len(), k);

    bounds
        .assignment
        .par_iter()
        .zip(bounds.upper.par_iter_mut())
        .zip(bounds.stale.par_iter_mut())
        .zip(bounds.lower.par_chunks_mut(k))
        .for_each(|(((&assign, upper), stale), lower)| {
            for (lb, &m) in lower.iter_mut().zip(movement) {
                *lb = (*lb - m).max(0.0);
            }
            let m = movement[assign as usize];
            *upper += m;
            if m > 0.0 {
                *stale = true;
            }
        });
}
