//! 验证与基准测试
//!
//! Generates seeded random problems, runs the engine next to the reference
//! Lloyd implementation and checks every output within fixed tolerances.

use std::fmt;
use rand::prelude::*;

use crate::api::{EngineConfig, Result};
use crate::dataset::Dataset;
use crate::kmeans::TriKMeans;
use crate::reference;
use crate::simd::l2_distance;
use crate::stats::{PruneStats, StageTimings, Timer};

/// Seed used by the preset runs
pub const DEFAULT_SEED: u64 = 100;

/// Preset (tests, points, dim, clusters, iterations) matrix
pub const SUITE: &[(usize, usize, usize, usize, usize)] = &[
    (1, 10, 4, 3, 1),
    (1, 1000, 60, 20, 1),
    (1, 100_000, 60, 20, 1),
    (1, 10_000, 600, 5, 1),
    (1, 10_000, 5, 600, 1),
    (1, 100, 5, 600, 1),
    (1, 100, 600, 5, 1),
    (1, 10, 20, 30, 1),
    (1, 10, 4, 3, 10),
    (1, 1000, 60, 20, 10),
    (1, 10_000, 60, 20, 10),
    (1, 1000, 600, 5, 10),
    (1, 1000, 5, 600, 10),
    (1, 100, 5, 600, 10),
    (1, 100, 600, 5, 10),
    (1, 10, 20, 30, 10),
];

/// A random clustering problem
#[derive(Debug, Clone)]
pub struct Problem {
    pub points: Dataset,
    pub centroids: Dataset,
}

/// Uniform [0, 1) points and initial centroids from a seeded RNG.
pub fn generate_problem(n: usize, dim: usize, k: usize, seed: u64) -> Result<Problem> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f32> = (0..n * dim).map(|_| rng.gen::<f32>()).collect();
    let clusters: Vec<f32> = (0..k * dim).map(|_| rng.gen::<f32>()).collect();
    Ok(Problem {
        points: Dataset::from_vectors(data, dim)?,
        centroids: Dataset::from_vectors(clusters, dim)?,
    })
}

/// Outcome of comparing the engine against the reference
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub n: usize,
    pub dim: usize,
    pub k: usize,
    pub iterations: usize,
    pub tests: usize,
    /// One message per failed check
    pub errors: Vec<String>,
    pub engine_ms: f64,
    pub reference_ms: f64,
    pub timings: StageTimings,
    pub prune: PruneStats,
}

impl ValidationReport {
    fn new(n: usize, dim: usize, k: usize, iterations: usize) -> Self {
        Self {
            n,
            dim,
            k,
            iterations,
            tests: 0,
            errors: Vec::new(),
            engine_ms: 0.0,
            reference_ms: 0.0,
            timings: StageTimings::new(),
            prune: PruneStats::default(),
        }
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    fn merge(&mut self, other: ValidationReport) {
        self.tests += other.tests;
        self.errors.extend(other.errors);
        self.engine_ms += other.engine_ms;
        self.reference_ms += other.reference_ms;
        self.timings.merge(&other.timings);
        self.prune.distance_computations += other.prune.distance_computations;
        self.prune.distances_pruned += other.prune.distances_pruned;
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tests = self.tests.max(1) as f64;
        writeln!(f, "---------------------------------------------")?;
        writeln!(f, "nPts      = {}", self.n)?;
        writeln!(f, "nDim      = {}", self.dim)?;
        writeln!(f, "nClusters = {}", self.k)?;
        writeln!(f, "nReps     = {}", self.iterations)?;
        writeln!(f, "average engine time (ms)    = {:.3}", self.engine_ms / tests)?;
        writeln!(f, "average reference time (ms) = {:.3}", self.reference_ms / tests)?;
        write!(f, "{}", self.timings)?;
        writeln!(f, "pruning: {}", self.prune)?;
        write!(f, "---------------------------------------------")
    }
}

fn check(errors: &mut Vec<String>, what: &str, max_err: f32, allowed: f32) {
    if max_err.is_nan() || max_err > allowed {
        errors.push(format!(
            "max {} error {:e} exceeds {:e}",
            what, max_err, allowed
        ));
    }
}

fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            if x == y {
                // also covers matching infinities
                0.0
            } else {
                (x - y).abs()
            }
        })
        .fold(0.0f32, |m, d| if d.is_nan() || d > m { d } else { m })
}

/// Run engine and reference on one problem and compare everything.
pub fn validate(problem: &Problem, iterations: usize, config: EngineConfig) -> Result<ValidationReport> {
    let points = &problem.points;
    let (n, dim, k) = (
        points.num_vectors(),
        points.dim(),
        problem.centroids.num_vectors(),
    );
    let mut report = ValidationReport::new(n, dim, k, iterations);
    report.tests = 1;

    let config = EngineConfig {
        iterations,
        tolerance: None,
        collect_diagnostics: true,
        ..config
    };
    let timer = Timer::new("engine");
    let result = TriKMeans::new(points, &problem.centroids, config)?.run()?;
    report.engine_ms = timer.elapsed_ms();
    drop(timer);

    let timer = Timer::new("reference");
    let expected = reference::lloyd(points, &problem.centroids, iterations)?;
    report.reference_ms = timer.elapsed_ms();
    drop(timer);

    report.timings = result.timings.clone();
    report.prune = result.prune;
    let errors = &mut report.errors;

    let differences = result
        .assignments
        .iter()
        .zip(&expected.assignments)
        .filter(|(a, b)| a != b)
        .count();
    if differences > 0 {
        errors.push(format!("{} errors in assignment", differences));
    }

    let mut counts = vec![0usize; k];
    for &a in &expected.assignments {
        counts[a as usize] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(0);
    let allowed = 1e-7 * max_count.max(dim) as f32;
    check(
        errors,
        "centroid",
        max_abs_diff(&result.centroids, &expected.centroids),
        allowed,
    );

    let Some(diag) = result.diagnostics.as_ref() else {
        errors.push("engine returned no diagnostics".into());
        return Ok(report);
    };

    // center distances were last computed on the centroids before the final update
    let prev = &expected.previous_centroids;
    let center = |c: usize| &prev[c * dim..(c + 1) * dim];
    let mut ccdist = vec![0.0f32; k * k];
    for i in 0..k {
        for j in 0..k {
            ccdist[i * k + j] = l2_distance(center(i), center(j));
        }
    }
    check(
        errors,
        "center distance",
        max_abs_diff(&diag.center_distances, &ccdist),
        1e-7 * dim as f32 * 2.0,
    );

    let half_nearest: Vec<f32> = (0..k)
        .map(|i| {
            0.5 * (0..k)
                .filter(|&j| j != i)
                .map(|j| ccdist[i * k + j])
                .fold(f32::INFINITY, f32::min)
        })
        .collect();
    check(
        errors,
        "half nearest",
        max_abs_diff(&diag.half_nearest, &half_nearest),
        1e-7 * dim as f32,
    );

    if iterations > 0 {
        let movement: Vec<f32> = (0..k)
            .map(|c| l2_distance(center(c), &expected.centroids[c * dim..(c + 1) * dim]))
            .collect();
        check(
            errors,
            "cluster movement",
            max_abs_diff(&diag.movement, &movement),
            1e-7 * dim as f32,
        );
    }

    if !report.errors.is_empty() {
        tracing::warn!("Validation failed for n={} dim={} k={}: {:?}", n, dim, k, report.errors);
    }
    Ok(report)
}

/// Validate the same seeded problem `n_tests` times and accumulate.
pub fn run_tests(
    n_tests: usize,
    n: usize,
    dim: usize,
    k: usize,
    iterations: usize,
    seed: u64,
    config: &EngineConfig,
) -> Result<ValidationReport> {
    let problem = generate_problem(n, dim, k, seed)?;
    let mut total = ValidationReport::new(n, dim, k, iterations);
    for _ in 0..n_tests {
        total.merge(validate(&problem, iterations, config.clone())?);
    }
    Ok(total)
}

/// One-line summary in the `[TEST](tests, pts, dim, clusters, reps)... OK` form.
pub fn quiet_run(
    n_tests: usize,
    n: usize,
    dim: usize,
    k: usize,
    iterations: usize,
    config: &EngineConfig,
) -> (String, Option<ValidationReport>) {
    let prefix = format!(
        "[TEST]({:3},{:8},{:5},{:5}, {:5})...",
        n_tests, n, dim, k, iterations
    );
    match run_tests(n_tests, n, dim, k, iterations, DEFAULT_SEED, config) {
        Ok(report) if report.passed() => (format!("{} OK", prefix), Some(report)),
        Ok(report) => (format!("{} *** ERROR ***", prefix), Some(report)),
        Err(e) => (format!("{} {}", prefix, e), None),
    }
}

/// Run every [`SUITE`] entry, skipping those with more clusters than points.
/// Returns the number of failed entries.
pub fn run_suite<F>(config: &EngineConfig, mut on_line: F) -> usize
where
    F: FnMut(&str, Option<&ValidationReport>),
{
    let mut failures = 0;
    for &(tests, n, dim, k, reps) in SUITE {
        if k > n {
            on_line(
                &format!("[TEST]({:3},{:8},{:5},{:5}, {:5})... skipped (k > n)", tests, n, dim, k, reps),
                None,
            );
            continue;
        }
        let (line, report) = quiet_run(tests, n, dim, k, reps, config);
        if !report.as_ref().map_or(false, |r| r.passed()) {
            failures += 1;
        }
        on_line(&line, report.as_ref());
    }
    failures
}
