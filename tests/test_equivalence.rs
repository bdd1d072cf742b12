//! Accelerated engine vs brute-force Lloyd on random problems

use trikmeans::benchmark::{generate_problem, run_tests, validate};
use trikmeans::EngineConfig;

#[test]
fn test_matches_reference_across_shapes() {
    let shapes = [
        // (n, dim, k, iterations)
        (10, 4, 3, 1),
        (10, 20, 10, 10),
        (100, 5, 30, 10),
        (500, 60, 20, 5),
        (1000, 2, 50, 15),
        (3000, 16, 8, 20),
    ];
    for (seed, &(n, dim, k, iterations)) in shapes.iter().enumerate() {
        let problem = generate_problem(n, dim, k, seed as u64 + 1).unwrap();
        let report = validate(&problem, iterations, EngineConfig::default()).unwrap();
        assert!(
            report.passed(),
            "n={} dim={} k={} iters={}: {:?}",
            n,
            dim,
            k,
            iterations,
            report.errors
        );
    }
}

#[test]
fn test_zero_iterations_matches_reference() {
    let problem = generate_problem(200, 8, 6, 9).unwrap();
    let report = validate(&problem, 0, EngineConfig::default()).unwrap();
    assert!(report.passed(), "{:?}", report.errors);
}

#[test]
fn test_repeated_runs_accumulate() {
    let config = EngineConfig::default().with_threads(2);
    let report = run_tests(3, 1000, 60, 20, 3, 100, &config).unwrap();
    assert_eq!(report.tests, 3);
    assert!(report.passed(), "{:?}", report.errors);
    assert!(report.engine_ms > 0.0);
    assert!(report.prune.distance_computations > 0);
    // bounds must skip at least some work on a clustered run
    assert!(report.prune.distances_pruned > 0);
}
