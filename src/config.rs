//! Reconstruction parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EstError, Result};

/// Parameters of the iterative loop.
///
/// Missing fields in a JSON file fall back to the defaults below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstConfig {
    /// Upper bound on the number of iterations
    pub num_iterations: usize,

    /// Stop once successive maximum residuals differ by less than this
    pub tolerance: f64,

    /// Step size applied to the normalized correction
    pub learning_rate: f64,
}

impl Default for EstConfig {
    fn default() -> Self {
        Self {
            num_iterations: 200,
            tolerance: 1e-5,
            learning_rate: 5e-5,
        }
    }
}

impl EstConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_iterations < 1 {
            return Err(EstError::invalid("num_iterations must be at least 1"));
        }
        // Written as negations so that NaN is rejected too
        if !(self.tolerance > 0.0) || self.tolerance.is_infinite() {
            return Err(EstError::invalid(format!("tolerance must be positive and finite, got {}", self.tolerance)));
        }
        if !(self.learning_rate > 0.0) || self.learning_rate.is_infinite() {
            return Err(EstError::invalid(format!("learning_rate must be positive and finite, got {}", self.learning_rate)));
        }
        Ok(())
    }
}
