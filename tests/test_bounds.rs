//! Bound soundness, checked after every stepped iteration

use trikmeans::benchmark::generate_problem;
use trikmeans::simd::l2_distance;
use trikmeans::{EngineConfig, EngineState, TriKMeans};

/// A few ULPs of f32 rounding per distance, plus one rounding per
/// Bound Maintenance pass since the bound was last exact.
fn slack(d: f32, steps: usize) -> f32 {
    4.0 * f32::EPSILON * (steps + 1) as f32 * d.max(1.0)
}

fn check_bounds(engine: &TriKMeans<'_>, steps: usize) {
    let points = engine.points();
    let bounds = engine.bounds();
    let k = bounds.k();
    for p in 0..points.num_vectors() {
        let x = points.vector(p);
        let a = bounds.assignment(p);
        let true_upper = l2_distance(x, engine.centroid(a));
        assert!(
            bounds.upper_bound(p) + slack(true_upper, steps) >= true_upper,
            "upper bound {} < {} for point {}",
            bounds.upper_bound(p),
            true_upper,
            p
        );
        for c in 0..k {
            let d = l2_distance(x, engine.centroid(c));
            assert!(
                bounds.lower_bound(c, p) <= d + slack(d, steps),
                "lower bound {} > {} for point {} center {}",
                bounds.lower_bound(c, p),
                d,
                p,
                c
            );
        }
    }
}

#[test]
fn test_bounds_hold_every_iteration() {
    let problem = generate_problem(800, 6, 12, 5).unwrap();
    let mut engine =
        TriKMeans::new(&problem.points, &problem.centroids, EngineConfig::new(8)).unwrap();

    engine.setup().unwrap();
    check_bounds(&engine, 0);

    let centers = engine.center_distances();
    for i in 0..centers.k() {
        assert_eq!(centers.get(i, i), 0.0);
        for j in 0..centers.k() {
            assert_eq!(centers.get(i, j), centers.get(j, i));
        }
    }

    let mut steps = 0;
    while engine.step().unwrap() {
        steps += 1;
        check_bounds(&engine, steps);
        assert!(engine.movement().iter().all(|&m| m >= 0.0));
    }
    assert_eq!(engine.state(), EngineState::Done);
}

#[test]
fn test_movement_shrinks() {
    let problem = generate_problem(2000, 3, 6, 17).unwrap();
    let mut engine =
        TriKMeans::new(&problem.points, &problem.centroids, EngineConfig::new(30)).unwrap();

    let mut totals = Vec::new();
    while engine.step().unwrap() {
        totals.push(engine.movement().iter().sum::<f32>());
    }
    assert_eq!(totals.len(), 30);
    // Lloyd converges: late iterations move far less than the first
    assert!(totals[29] <= totals[0] * 0.25, "{:?}", totals);
}

#[test]
fn test_changed_clusters_track_reassignment() {
    let problem = generate_problem(500, 4, 10, 23).unwrap();
    let mut engine =
        TriKMeans::new(&problem.points, &problem.centroids, EngineConfig::new(2)).unwrap();
    engine.setup().unwrap();
    let before = engine.assignments().to_vec();
    engine.step().unwrap();
    engine.step().unwrap();

    // second refinement moved points relative to the first assignment
    let after = engine.assignments();
    let changed = engine.changed_clusters();
    for (old, new) in before.iter().zip(after) {
        if old != new {
            assert!(changed[*old as usize] || changed[*new as usize]);
        }
    }
}
