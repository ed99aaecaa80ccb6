//! The iterative reconstruction loop.

use log::{debug, info, warn};
use ndarray::{ArrayView2, Zip};
use serde::Serialize;

use crate::angles::AngleSet;
use crate::config::EstConfig;
use crate::error::{EstError, Result};
use crate::init::{initial_estimate, Initializer};
use crate::projector::{Backprojector, ForwardProjector, RotationProjector};
use crate::Image;

/// Progress of one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IterationRecord {
    /// 1-based iteration number
    pub iteration: usize,
    /// Largest absolute residual between observed and simulated sinograms
    pub max_error: f64,
}

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Termination {
    /// Successive maximum errors differed by less than the tolerance.
    Converged { iteration: usize },
    /// The iteration budget ran out first.
    Exhausted,
}

/// Final image together with the per-iteration trace.
#[derive(Clone, Debug)]
pub struct Reconstruction {
    pub image: Image,
    pub trace: Vec<IterationRecord>,
    pub termination: Termination,
}

/// Equally sloped tomography reconstruction.
///
/// Each iteration projects the current estimate, backprojects the residual
/// against the observed sinogram, normalizes that correction by its own
/// largest magnitude, takes a damped step and clips negative densities.
#[derive(Clone, Debug, Default)]
pub struct Reconstructor<P = RotationProjector> {
    config: EstConfig,
    projector: P,
}

impl Reconstructor {
    pub fn new(config: EstConfig) -> Self {
        Self { config, projector: RotationProjector }
    }
}

impl<P> Reconstructor<P>
where
    P: ForwardProjector + Backprojector,
{
    pub fn with_projector(config: EstConfig, projector: P) -> Self {
        Self { config, projector }
    }

    pub fn config(&self) -> &EstConfig { &self.config }

    pub fn projector(&self) -> &P { &self.projector }

    pub fn reconstruct<I>(&self, observed: ArrayView2<f64>, angles: &AngleSet, initializer: &I) -> Result<Reconstruction>
    where
        I: Initializer + ?Sized,
    {
        self.reconstruct_with_progress(observed, angles, initializer, |_| {})
    }

    /// As [`Self::reconstruct`], calling `progress` after the residual of
    /// every iteration has been measured.
    pub fn reconstruct_with_progress<I, F>(
        &self,
        observed: ArrayView2<f64>,
        angles: &AngleSet,
        initializer: &I,
        mut progress: F,
    ) -> Result<Reconstruction>
    where
        I: Initializer + ?Sized,
        F: FnMut(&IterationRecord),
    {
        self.validate(observed, angles)?;

        let mut image = initial_estimate(initializer, observed, angles)?;
        let shape = image.dim();
        let (num_projections, num_detectors) = observed.dim();
        let EstConfig { num_iterations, tolerance, learning_rate } = self.config;

        info!(
            "EST reconstruction: {num_projections} projections x {num_detectors} detectors -> {}x{} image, \
             up to {num_iterations} iterations (tolerance {tolerance:e}, learning rate {learning_rate:e})",
            shape.0, shape.1,
        );

        let mut trace = Vec::with_capacity(num_iterations);
        let mut previous_max_error = f64::INFINITY;

        for iteration in 1..=num_iterations {
            let simulated = self.projector.project(image.view(), angles, num_detectors);
            if simulated.dim() != observed.dim() {
                return Err(EstError::shape(observed.dim(), simulated.dim()));
            }
            let residual = &observed - &simulated;
            let max_error = max_abs(residual.view());

            let record = IterationRecord { iteration, max_error };
            debug!("iteration {iteration}: max error {max_error:e}");
            progress(&record);
            trace.push(record);

            // Plateau detection: compares successive errors, not the error itself
            if (previous_max_error - max_error).abs() < tolerance {
                info!("converged after {iteration} iterations (max error {max_error:e})");
                return Ok(Reconstruction { image, trace, termination: Termination::Converged { iteration } });
            }
            previous_max_error = max_error;

            let mut correction = self.projector.backproject(residual.view(), angles, shape);
            if correction.dim() != shape {
                return Err(EstError::shape(shape, correction.dim()));
            }
            let scale = max_abs(correction.view());
            if scale != 0.0 {
                correction.mapv_inplace(|c| c / scale);
            } else {
                warn!("iteration {iteration}: correction vanished, skipping normalization");
            }

            let per_projection = num_projections as f64;
            Zip::from(&mut image).and(&correction).for_each(|v, &c| {
                *v = (*v + learning_rate * (c / per_projection)).max(0.0);
            });
        }

        info!("iteration budget of {num_iterations} exhausted (max error {previous_max_error:e})");
        Ok(Reconstruction { image, trace, termination: Termination::Exhausted })
    }

    fn validate(&self, observed: ArrayView2<f64>, angles: &AngleSet) -> Result<()> {
        self.config.validate()?;
        if angles.len() < 2 {
            return Err(EstError::invalid(format!("at least 2 projection angles are required, got {}", angles.len())));
        }
        let (rows, cols) = observed.dim();
        if angles.len() != rows {
            return Err(EstError::invalid(format!(
                "{} angles given for a sinogram with {rows} rows", angles.len()
            )));
        }
        if cols == 0 {
            return Err(EstError::invalid("sinogram has no detector columns"));
        }
        if observed.iter().any(|v| !v.is_finite()) {
            return Err(EstError::invalid("sinogram contains non-finite values"));
        }
        Ok(())
    }
}

fn max_abs(values: ArrayView2<f64>) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}
