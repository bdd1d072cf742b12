//! 统计与监控模块
//!
//! Per-stage wall time and pruning counters for a clustering run.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Compute stages, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ClusterDistance,
    BoundInit,
    Refine,
    CentroidUpdate,
    BoundMaintenance,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::ClusterDistance,
        Stage::BoundInit,
        Stage::Refine,
        Stage::CentroidUpdate,
        Stage::BoundMaintenance,
    ];

    fn index(self) -> usize {
        match self {
            Stage::ClusterDistance => 0,
            Stage::BoundInit => 1,
            Stage::Refine => 2,
            Stage::CentroidUpdate => 3,
            Stage::BoundMaintenance => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Stage::ClusterDistance => "cluster_distance",
            Stage::BoundInit => "bound_init",
            Stage::Refine => "refine",
            Stage::CentroidUpdate => "centroid_update",
            Stage::BoundMaintenance => "bound_maintenance",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 单个阶段的计时
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub calls: u64,
    pub total: Duration,
}

impl StageTiming {
    pub fn avg_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / self.calls as f64
        }
    }
}

/// 各阶段运行时统计
#[derive(Debug, Clone, Serialize)]
pub struct StageTimings {
    entries: [StageTiming; 5],
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            entries: Stage::ALL.map(|stage| StageTiming {
                stage,
                calls: 0,
                total: Duration::ZERO,
            }),
        }
    }
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let e = &mut self.entries[stage.index()];
        e.calls += 1;
        e.total += elapsed;
    }

    pub fn get(&self, stage: Stage) -> &StageTiming {
        &self.entries[stage.index()]
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|e| e.total).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageTiming> {
        self.entries.iter()
    }

    /// Accumulate another run's timings into this one
    pub fn merge(&mut self, other: &StageTimings) {
        for (mine, theirs) in self.entries.iter_mut().zip(other.entries.iter()) {
            mine.calls += theirs.calls;
            mine.total += theirs.total;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            writeln!(
                f,
                "{:>18} time (ms) = {:.3}  ({} calls, {:.3} avg)",
                e.stage.name(),
                e.total.as_secs_f64() * 1000.0,
                e.calls,
                e.avg_ms()
            )?;
        }
        Ok(())
    }
}

/// Distance computation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// Exact point-to-center distances computed
    pub distance_computations: u64,
    /// Candidate (point, cluster) pairs skipped by the pruning rule
    pub distances_pruned: u64,
}

impl PruneStats {
    /// Fraction of refinement candidates that were skipped
    pub fn skip_fraction(&self) -> f64 {
        let total = self.distance_computations + self.distances_pruned;
        if total == 0 {
            0.0
        } else {
            self.distances_pruned as f64 / total as f64
        }
    }
}

impl fmt::Display for PruneStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} distances computed, {} pruned ({:.1}% skipped)",
            self.distance_computations,
            self.distances_pruned,
            self.skip_fraction() * 100.0
        )
    }
}

/// 性能计时器
pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        tracing::trace!("{} took {:.2} ms", self.name, self.elapsed_ms());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_stage_timings() {
        let mut timings = StageTimings::new();
        timings.record(Stage::Refine, Duration::from_micros(100));
        timings.record(Stage::Refine, Duration::from_micros(300));
        timings.record(Stage::BoundInit, Duration::from_micros(50));

        let refine = timings.get(Stage::Refine);
        assert_eq!(refine.calls, 2);
        assert!((refine.avg_ms() - 0.2).abs() < 1e-9);
        assert_eq!(timings.get(Stage::CentroidUpdate).calls, 0);
        assert_eq!(timings.total(), Duration::from_micros(450));
    }

    #[test]
    fn test_merge() {
        let mut a = StageTimings::new();
        let mut b = StageTimings::new();
        a.record(Stage::ClusterDistance, Duration::from_millis(1));
        b.record(Stage::ClusterDistance, Duration::from_millis(2));
        a.merge(&b);
        assert_eq!(a.get(Stage::ClusterDistance).calls, 2);
        assert_eq!(a.get(Stage::ClusterDistance).total, Duration::from_millis(3));
    }

    #[test]
    fn test_skip_fraction() {
        let s = PruneStats {
            distance_computations: 25,
            distances_pruned: 75,
        };
        assert!((s.skip_fraction() - 0.75).abs() < 1e-12);
        assert_eq!(PruneStats::default().skip_fraction(), 0.0);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::new("test");
        thread::sleep(Duration::from_millis(1));
        assert!(timer.elapsed_ms() >= 1.0);
    }
}
