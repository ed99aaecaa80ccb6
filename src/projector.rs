//! Forward projection and unfiltered backprojection.
//!
//! The sinogram convention used throughout the crate: row `k` holds the
//! projection taken at `angles[k]`, column `j` is detector position `j`.

use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};

#[cfg(not(feature = "serial"))]
use rayon::prelude::*;

use crate::angles::AngleSet;
use crate::rotate::rotate;
use crate::{Image, Sinogram};

/// Forward model: image -> sinogram.
pub trait ForwardProjector {
    /// Simulate one projection per angle, each exactly `num_detectors` long.
    fn project(&self, image: ArrayView2<f64>, angles: &AngleSet, num_detectors: usize) -> Sinogram;
}

/// Maps a sinogram-space residual back into image space.
pub trait Backprojector {
    fn backproject(&self, residual: ArrayView2<f64>, angles: &AngleSet, shape: (usize, usize)) -> Image;
}

/// Rotate-and-sum projector built on bilinear image rotation.
///
/// Work for different angles is independent and is spread over the rayon
/// thread pool unless the `serial` feature is enabled. Backprojection sums
/// angles in fixed chunks of [`ANGLES_PER_CHUNK`], a bounded wave of chunks
/// at a time, and folds the chunk sums into one accumulator in angle order.
/// Chunk boundaries never depend on the thread count, so the output is the
/// same however the work was scheduled, and memory stays bounded by the wave
/// size rather than the number of angles.
#[derive(Clone, Copy, Debug, Default)]
pub struct RotationProjector;

/// Angles summed sequentially into one partial image.
pub const ANGLES_PER_CHUNK: usize = 8;

/// Chunks evaluated together before being folded into the accumulator.
const CHUNKS_PER_WAVE: usize = 16;

impl ForwardProjector for RotationProjector {
    fn project(&self, image: ArrayView2<f64>, angles: &AngleSet, num_detectors: usize) -> Sinogram {
        let rows = ordered_map(angles.as_slice(), |&theta| {
            let rotated = rotate(image, theta);
            let profile = rotated.sum_axis(Axis(0));
            fit_to_detectors(profile.view(), num_detectors)
        });

        let mut sinogram = Sinogram::zeros((angles.len(), num_detectors));
        for (mut dst, row) in sinogram.outer_iter_mut().zip(rows) {
            dst.assign(&row);
        }
        sinogram
    }
}

impl Backprojector for RotationProjector {
    fn backproject(&self, residual: ArrayView2<f64>, angles: &AngleSet, shape: (usize, usize)) -> Image {
        let (_, cols) = shape;
        let width = residual.ncols().min(cols);
        let num_angles = angles.len();

        let smeared = |k: usize| {
            // Every image row receives the same residual line
            let mut field = Image::zeros(shape);
            field.slice_mut(s![.., ..width]).assign(&residual.slice(s![k, ..width]));
            rotate(field.view(), -angles.as_slice()[k])
        };

        let mut correction = Image::zeros(shape);
        let wave_len = ANGLES_PER_CHUNK * CHUNKS_PER_WAVE;
        for wave_start in (0..num_angles).step_by(wave_len) {
            let wave_end = (wave_start + wave_len).min(num_angles);
            let chunk_starts: Vec<usize> = (wave_start..wave_end).step_by(ANGLES_PER_CHUNK).collect();

            let partials = ordered_map(&chunk_starts, |&start| {
                let stop = (start + ANGLES_PER_CHUNK).min(wave_end);
                (start..stop).fold(Image::zeros(shape), |mut partial, k| {
                    partial += &smeared(k);
                    partial
                })
            });
            for partial in partials {
                correction += &partial;
            }
        }
        correction
    }
}

/// Force a projection profile to exactly `num_detectors` samples.
///
/// Longer profiles lose their trailing samples; shorter ones are padded with
/// zeros at the end. Nothing is re-centred or resampled.
pub fn fit_to_detectors(profile: ArrayView1<f64>, num_detectors: usize) -> Array1<f64> {
    let mut fitted = Array1::zeros(num_detectors);
    let n = profile.len().min(num_detectors);
    fitted.slice_mut(s![..n]).assign(&profile.slice(s![..n]));
    fitted
}

// Map `f` over `items`, returning results in input order.
fn ordered_map<I, T, F>(items: &[I], f: F) -> Vec<T>
where
    I: Sync,
    T: Send,
    F: Fn(&I) -> T + Sync + Send,
{
    #[cfg    (feature = "serial") ] let iter = items.    iter();
    #[cfg(not(feature = "serial"))] let iter = items.par_iter();
    iter.map(f).collect()
}
