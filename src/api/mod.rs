//! API module - public interfaces

pub mod config;
pub mod result;

pub use config::EngineConfig;
pub use result::{ClusterResult, Diagnostics};

use thiserror::Error;

use crate::stats::Stage;

#[derive(Error, Debug)]
pub enum KmeansError {
    #[error("Invalid argument: {0}")]
    InvalidArg(String),

    #[error("Invalid cluster count: k={k}, n={n} (need 0 < k <= n)")]
    InvalidClusterCount { k: usize, n: usize },

    #[error("Dimension mismatch: points have dim {points}, centroids have dim {centroids}")]
    DimensionMismatch { points: usize, centroids: usize },

    #[error("Non-finite value in {what} at index {index}")]
    NonFinite { what: &'static str, index: usize },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Stage {stage} failed: {reason}")]
    StageFailed { stage: Stage, reason: String },

    #[error("Engine aborted by an earlier stage failure")]
    Aborted,
}

impl From<serde_json::Error> for KmeansError {
    fn from(e: serde_json::Error) -> Self {
        KmeansError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KmeansError>;
