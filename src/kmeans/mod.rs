//! Triangle-inequality accelerated k-means
//!
//! Same assignments and centers as plain Lloyd iterations, but most
//! point-to-center distances are skipped using per-point bounds.
//!
//! Pipeline per iteration:
//! Cluster-Distance -> Refinement -> Centroid Update -> Bound Maintenance.
//! Bound Initialization runs once during setup.

pub mod buffers;
pub mod cluster_dist;
pub mod init;
pub mod maintain;
pub mod refine;
pub mod update;

pub use buffers::{Bounds, CenterDistances, CentroidBuffers};

use std::time::Instant;

use tracing::{debug, info};

use crate::api::{ClusterResult, Diagnostics, EngineConfig, KmeansError, Result};
use crate::atomic_utils::{AtomicFlags, PruneCounters};
use crate::dataset::Dataset;
use crate::executor::Device;
use crate::simd::detect_simd_level;
use crate::stats::{PruneStats, Stage, StageTimings};

/// Driver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Buffers allocated, bounds not yet initialized
    Setup,
    /// `iteration` steady iterations completed so far
    Steady { iteration: usize },
    /// Finished; results are final
    Done,
    /// A stage failed; bounds are inconsistent and nothing can be returned
    Aborted,
}

/// Engine context: owns the device and every run buffer.
pub struct TriKMeans<'a> {
    config: EngineConfig,
    device: Device,
    points: &'a Dataset,
    centroids: CentroidBuffers,
    bounds: Bounds,
    centers: CenterDistances,
    movement: Vec<f32>,
    changed: AtomicFlags,
    counters: PruneCounters,
    state: EngineState,
    /// Center distances already match the current centroids
    centers_fresh: bool,
    completed: usize,
    started: Instant,
}

impl<'a> TriKMeans<'a> {
    /// Validate the inputs and allocate all buffers. K is the number of
    /// rows in `centroids`.
    pub fn new(points: &'a Dataset, centroids: &Dataset, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let n = points.num_vectors();
        let k = centroids.num_vectors();
        if points.dim() != centroids.dim() {
            return Err(KmeansError::DimensionMismatch {
                points: points.dim(),
                centroids: centroids.dim(),
            });
        }
        if k == 0 || k > n {
            return Err(KmeansError::InvalidClusterCount { k, n });
        }
        points.check_finite("points")?;
        centroids.check_finite("centroids")?;

        let device = Device::new(config.num_threads)?;

        Ok(Self {
            config,
            device,
            points,
            centroids: CentroidBuffers::new(centroids.vectors().to_vec(), points.dim()),
            bounds: Bounds::new(n, k),
            centers: CenterDistances::new(k),
            movement: vec![0.0; k],
            changed: AtomicFlags::new(k),
            counters: PruneCounters::new(),
            state: EngineState::Setup,
            centers_fresh: false,
            completed: 0,
            started: Instant::now(),
        })
    }

    /// Compute center distances and initialize bounds and assignments.
    pub fn setup(&mut self) -> Result<()> {
        match self.state {
            EngineState::Setup => {}
            EngineState::Aborted => return Err(KmeansError::Aborted),
            _ => {
                return Err(KmeansError::InvalidArg(
                    "setup already completed".into(),
                ))
            }
        }

        info!(
            "Setup: n={}, dim={}, k={}, iterations={}, threads={}, simd={:?}",
            self.points.num_vectors(),
            self.points.dim(),
            self.centroids.k(),
            self.config.iterations,
            self.device.num_threads(),
            detect_simd_level()
        );

        if let Err(e) = self.run_setup() {
            self.state = EngineState::Aborted;
            return Err(e);
        }
        self.state = EngineState::Steady { iteration: 0 };
        Ok(())
    }

    fn run_setup(&mut self) -> Result<()> {
        self.refresh_center_distances()?;

        let points = self.points;
        let centroids = self.centroids.current();
        let bounds = &mut self.bounds;
        let counters = &self.counters;
        self.device.launch(Stage::BoundInit, || {
            init::initialize_bounds(points, centroids, bounds, counters)
        })
    }

    fn refresh_center_distances(&mut self) -> Result<()> {
        let dim = self.centroids.dim();
        let centroids = self.centroids.current();
        let centers = &mut self.centers;
        self.device.launch(Stage::ClusterDistance, || {
            cluster_dist::compute_center_distances(centroids, dim, centers)
        })?;
        self.centers_fresh = true;
        Ok(())
    }

    /// Run one steady iteration, running setup first if needed.
    ///
    /// Returns `false` once the configured iterations are exhausted (or the
    /// tolerance was reached) and no iteration was run.
    pub fn step(&mut self) -> Result<bool> {
        let iteration = match self.state {
            EngineState::Setup => {
                self.setup()?;
                0
            }
            EngineState::Steady { iteration } => iteration,
            EngineState::Done => return Ok(false),
            EngineState::Aborted => return Err(KmeansError::Aborted),
        };

        if iteration >= self.config.iterations {
            self.state = EngineState::Done;
            return Ok(false);
        }

        match self.run_iteration(iteration) {
            Ok(converged) => {
                self.completed = iteration + 1;
                self.state = if converged || self.completed >= self.config.iterations {
                    EngineState::Done
                } else {
                    EngineState::Steady {
                        iteration: self.completed,
                    }
                };
                Ok(true)
            }
            Err(e) => {
                self.state = EngineState::Aborted;
                Err(e)
            }
        }
    }

    /// Returns whether the tolerance was reached.
    fn run_iteration(&mut self, iteration: usize) -> Result<bool> {
        // setup already computed distances for the initial centers
        if !self.centers_fresh {
            self.refresh_center_distances()?;
        }
        self.centers_fresh = false;

        self.changed.clear_all();
        {
            let points = self.points;
            let centroids = self.centroids.current();
            let centers = &self.centers;
            let bounds = &mut self.bounds;
            let changed = &self.changed;
            let counters = &self.counters;
            self.device.launch(Stage::Refine, || {
                refine::refine_assignments(points, centroids, centers, bounds, changed, counters)
            })?;
        }

        let empty = {
            let points = self.points;
            let assignment = &self.bounds.assignment;
            let (prev, next) = self.centroids.split();
            let movement = &mut self.movement;
            self.device.launch(Stage::CentroidUpdate, || {
                update::update_centroids(points, assignment, prev, next, movement)
            })?
        };

        {
            let movement = &self.movement;
            let bounds = &mut self.bounds;
            self.device.launch(Stage::BoundMaintenance, || {
                maintain::widen_bounds(movement, bounds)
            })?;
        }

        self.centroids.swap();

        let total_movement: f32 = self.movement.iter().sum();
        debug!(
            "Iteration {}: total movement {:.6}, {} clusters changed, {} empty",
            iteration + 1,
            total_movement,
            self.changed.count_set(),
            empty
        );

        Ok(matches!(self.config.tolerance, Some(tol) if total_movement <= tol))
    }

    /// Setup, all iterations, then the final result.
    pub fn run(self) -> Result<ClusterResult> {
        self.finish()
    }

    /// Consume a finished engine. Any remaining iterations are run first.
    pub fn finish(mut self) -> Result<ClusterResult> {
        if self.state == EngineState::Aborted {
            return Err(KmeansError::Aborted);
        }
        while self.step()? {}

        if self.state != EngineState::Done {
            return Err(KmeansError::Aborted);
        }
        let iterations = self.completed;
        let prune = self.counters.snapshot();
        info!("Done after {} iterations: {}", iterations, prune);

        let diagnostics = self.config.collect_diagnostics.then(|| Diagnostics {
            center_distances: self.centers.matrix().to_vec(),
            half_nearest: self.centers.half_nearest_all().to_vec(),
            movement: self.movement.clone(),
            changed: self.changed.to_vec(),
        });

        Ok(ClusterResult {
            dim: self.centroids.dim(),
            k: self.centroids.k(),
            assignments: self.bounds.assignment.clone(),
            iterations,
            diagnostics,
            timings: self.device.timings().clone(),
            prune,
            elapsed_ms: self.started.elapsed().as_secs_f64() * 1000.0,
            centroids: self.centroids.into_current(),
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn points(&self) -> &Dataset {
        self.points
    }

    /// Current centroids, K x D row-major
    pub fn centroids(&self) -> &[f32] {
        self.centroids.current()
    }

    pub fn centroid(&self, c: usize) -> &[f32] {
        self.centroids.centroid(c)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn assignments(&self) -> &[u32] {
        self.bounds.assignments()
    }

    pub fn center_distances(&self) -> &CenterDistances {
        &self.centers
    }

    pub fn movement(&self) -> &[f32] {
        &self.movement
    }

    pub fn changed_clusters(&self) -> Vec<bool> {
        self.changed.to_vec()
    }

    pub fn prune_stats(&self) -> PruneStats {
        self.counters.snapshot()
    }

    pub fn timings(&self) -> &StageTimings {
        self.device.timings()
    }
}

/// Cluster `points` starting from `centroids` for a fixed number of
/// iterations.
pub fn kmeans(points: &Dataset, centroids: &Dataset, iterations: usize) -> Result<ClusterResult> {
    TriKMeans::new(points, centroids, EngineConfig::new(iterations))?.run()
}
