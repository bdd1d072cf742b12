//! Compute device backed by a rayon thread pool
//!
//! Stands in for the accelerator context: it owns the worker pool, runs one
//! stage at a time inside it and times each launch. Each `launch` returns
//! only after every work item of the stage has finished, so stages never
//! overlap.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::api::{KmeansError, Result};
use crate::stats::{Stage, StageTimings};

/// Parallel executor for the clustering stages
pub struct Device {
    pool: rayon::ThreadPool,
    timings: StageTimings,
}

impl Device {
    /// Create a device with `num_threads` workers (None = rayon default)
    pub fn new(num_threads: Option<usize>) -> Result<Self> {
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("trikmeans-worker-{}", i));
        if let Some(n) = num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder
            .build()
            .map_err(|e| KmeansError::Device(e.to_string()))?;
        Ok(Self {
            pool,
            timings: StageTimings::new(),
        })
    }

    /// Get the number of worker threads
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run one stage to completion on the pool.
    ///
    /// A panic anywhere in the stage, including inside rayon workers, is
    /// reported as [`KmeansError::StageFailed`].
    pub fn launch<F, R>(&mut self, stage: Stage, f: F) -> Result<R>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let start = Instant::now();
        let outcome = self
            .pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(f)));
        self.timings.record(stage, start.elapsed());

        outcome.map_err(|payload| {
            let reason = panic_message(payload.as_ref());
            tracing::warn!("Stage {} failed: {}", stage, reason);
            KmeansError::StageFailed { stage, reason }
        })
    }

    pub fn timings(&self) -> &StageTimings {
        &self.timings
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_launch_returns_value() {
        let mut device = Device::new(Some(2)).unwrap();
        assert_eq!(device.num_threads(), 2);

        let data: Vec<u64> = (1..=100).collect();
        let sum = device
            .launch(Stage::CentroidUpdate, || data.par_iter().sum::<u64>())
            .unwrap();
        assert_eq!(sum, 5050);
        assert_eq!(device.timings().get(Stage::CentroidUpdate).calls, 1);
    }

    #[test]
    fn test_launch_mutates_buffer() {
        let mut device = Device::new(Some(2)).unwrap();
        let mut buf = vec![1.0f32; 64];
        device
            .launch(Stage::BoundMaintenance, || {
                buf.par_iter_mut().for_each(|v| *v *= 2.0);
            })
            .unwrap();
        assert!(buf.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_panicking_stage_is_fatal_error() {
        let mut device = Device::new(Some(2)).unwrap();
        let err = device
            .launch(Stage::Refine, || {
                (0..16usize).into_par_iter().for_each(|i| {
                    if i == 7 {
                        panic!("work item {} failed", i);
                    }
                });
            })
            .unwrap_err();
        match err {
            KmeansError::StageFailed { stage, reason } => {
                assert_eq!(stage, Stage::Refine);
                assert!(reason.contains("work item 7 failed"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
