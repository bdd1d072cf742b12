//! trikmeans - Triangle-inequality accelerated k-means
//!
//! Exact Lloyd iterations where per-point lower/upper bounds and
//! center-to-center distances let most distance computations be skipped.

pub mod api;
pub mod atomic_utils;
pub mod benchmark;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod kmeans;
pub mod reference;
pub mod simd;
pub mod stats;

pub use api::{ClusterResult, Diagnostics, EngineConfig, KmeansError, Result};
pub use dataset::Dataset;
pub use error::ErrorCode;
pub use executor::Device;
pub use kmeans::{kmeans, EngineState, TriKMeans};
pub use stats::{PruneStats, Stage, StageTimings};

use tracing::info;

/// Install the global `tracing` subscriber (filter from `RUST_LOG`).
/// Calling it again is a no-op.
pub fn init_logging() {
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()
        .is_ok();

    if initialized {
        info!("trikmeans {} initialized", env!("CARGO_PKG_VERSION"));
    }
}
