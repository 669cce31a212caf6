use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use oja_core::MultivariateNormal;
use serde::{Deserialize, Serialize};

use super::Schedule;
use crate::error::{ExperimentError, Result};

const REFERENCE_REPETITIONS: NonZeroUsize = NonZeroUsize::new(500).unwrap();

/// Everything a sweep needs: the starting point, the input distributions, the
/// learning rate schedule and how many repetitions back each estimate.
///
/// Missing keys in a config file fall back to the reference setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub ndim: usize,
    pub initial_weights: Vec<f64>,
    /// One output file is written per correlation.
    pub correlations: Vec<f64>,
    pub schedule: Schedule,
    pub repetitions: NonZeroUsize,
    /// Samples drawn per batch.
    pub batch_size: usize,
    /// Fixes every random draw of the sweep when set.
    pub seed: Option<u64>,
    /// Size of a dedicated worker pool, the global one is used otherwise.
    pub threads: Option<NonZeroUsize>,
    pub output_dir: PathBuf,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            ndim: 2,
            initial_weights: vec![0.0, 1.0],
            correlations: vec![-0.3, -0.7, 0.3, 0.7],
            schedule: Schedule::reference(),
            repetitions: REFERENCE_REPETITIONS,
            batch_size: 10_000,
            seed: None,
            threads: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl SweepConfig {
    /// Reads a config from a JSON file and validates it.
    ///
    /// # Errors
    /// `ExperimentError::Io` if the file can't be read, `ExperimentError::Format`
    /// if it isn't valid JSON for this struct and `ExperimentError::InvalidConfig`
    /// if the values don't pass `validate`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ExperimentError::Format(format!("invalid config '{}': {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the config can drive a sweep.
    pub fn validate(&self) -> Result<()> {
        if self.ndim == 0 {
            return Err(ExperimentError::InvalidConfig(
                "ndim must be greater than 0".into(),
            ));
        }

        if self.initial_weights.len() != self.ndim {
            return Err(ExperimentError::InvalidConfig(format!(
                "initial_weights has {} entries, expected ndim ({})",
                self.initial_weights.len(),
                self.ndim
            )));
        }

        if self.correlations.is_empty() {
            return Err(ExperimentError::InvalidConfig(
                "at least one correlation is required".into(),
            ));
        }

        if let Some(rho) = self.correlations.iter().find(|rho| !rho.is_finite()) {
            return Err(ExperimentError::InvalidConfig(format!(
                "correlation ({rho}) must be finite"
            )));
        }

        for &rho in &self.correlations {
            MultivariateNormal::equicorrelated(self.ndim, rho).map_err(|e| {
                ExperimentError::InvalidConfig(format!(
                    "correlation ({rho}) is unusable with ndim {}: {e}",
                    self.ndim
                ))
            })?;
        }

        if self.batch_size == 0 {
            return Err(ExperimentError::InvalidConfig(
                "batch_size must be greater than 0".into(),
            ));
        }

        self.schedule.validate()
    }
}
