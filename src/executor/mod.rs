//! Executor module - stage execution on the compute pool

pub mod threadpool;

pub use threadpool::Device;
