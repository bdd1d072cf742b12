//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{KmeansError, Result};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of steady-state iterations to run
    pub iterations: usize,
    /// Worker threads for the compute pool (None = rayon default)
    #[serde(default)]
    pub num_threads: Option<usize>,
    /// Stop early once the summed centroid movement of an iteration
    /// drops to this value. None runs the full iteration count.
    #[serde(default)]
    pub tolerance: Option<f32>,
    /// Return center distances, movement and changed flags with the result
    #[serde(default = "default_diagnostics")]
    pub collect_diagnostics: bool,
}

fn default_diagnostics() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            num_threads: None,
            tolerance: None,
            collect_diagnostics: true,
        }
    }
}

impl EngineConfig {
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_diagnostics(mut self, collect: bool) -> Self {
        self.collect_diagnostics = collect;
        self
    }

    /// Parse a JSON config. A negative or fractional iteration count fails
    /// here, since `iterations` is unsigned.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded engine config from {:?}", path.as_ref());
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(KmeansError::Config("num_threads must be > 0".into()));
        }
        if let Some(tol) = self.tolerance {
            if !tol.is_finite() || tol < 0.0 {
                return Err(KmeansError::Config(format!(
                    "tolerance must be finite and >= 0, got {}",
                    tol
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config = EngineConfig::from_json(r#"{"iterations": 5}"#).unwrap();
        assert_eq!(config.iterations, 5);
        assert_eq!(config.num_threads, None);
        assert_eq!(config.tolerance, None);
        assert!(config.collect_diagnostics);
    }

    #[test]
    fn test_negative_iterations_rejected() {
        let err = EngineConfig::from_json(r#"{"iterations": -1}"#).unwrap_err();
        assert!(matches!(err, KmeansError::Config(_)));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = EngineConfig::new(3).with_threads(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_tolerance_rejected() {
        assert!(EngineConfig::new(3).with_tolerance(-1.0).validate().is_err());
        assert!(EngineConfig::new(3).with_tolerance(f32::NAN).validate().is_err());
        assert!(EngineConfig::new(3).with_tolerance(0.0).validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EngineConfig::new(7).with_threads(2).with_tolerance(1e-6);
        let text = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&text).unwrap(), config);
    }
}
