//! Equally sloped tomography (EST).
//!
//! Reconstructs a 2D density from a sparse set of 1D projections. The
//! projection angles are chosen so that their sines, rather than the angles
//! themselves, are evenly spaced ([`AngleSet::equally_sloped`]). Starting from
//! an external estimate, [`Reconstructor`] alternates forward projection,
//! residual measurement and unfiltered backprojection, taking damped,
//! non-negative steps until the residual stops changing.
//!
//! ```no_run
//! use est_core::{AngleSet, EstConfig, Reconstructor, RotationProjector, ForwardProjector, Uniform, Image};
//!
//! let phantom = Image::from_elem((64, 64), 1.0);
//! let angles = AngleSet::equally_sloped(32)?;
//! let observed = RotationProjector.project(phantom.view(), &angles, 64);
//!
//! let result = Reconstructor::new(EstConfig::default())
//!     .reconstruct(observed.view(), &angles, &Uniform { value: 0.0 })?;
//! println!("{:?} after {} iterations", result.termination, result.trace.len());
//! # Ok::<(), est_core::EstError>(())
//! ```

use ndarray::Array2;

pub mod angles;
pub mod config;
pub mod engine;
pub mod error;
pub mod init;
pub mod io;
pub mod projector;
pub mod rotate;

/// Square grid of non-negative densities, indexed `[row, column]`.
pub type Image = Array2<f64>;

/// One row per projection angle, one column per detector position.
pub type Sinogram = Array2<f64>;

pub use angles::AngleSet;
pub use config::EstConfig;
pub use engine::{IterationRecord, Reconstruction, Reconstructor, Termination};
pub use error::{EstError, Result};
pub use init::{FnInitializer, Initializer, Orientation, Precomputed, SinogramLayout, Uniform};
pub use projector::{fit_to_detectors, Backprojector, ForwardProjector, RotationProjector};
