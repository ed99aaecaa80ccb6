//! Seeding the iteration with a first image estimate.
//!
//! The reconstruction loop works in one canonical frame: sinogram rows are
//! angles, sinogram columns are detector positions, and image row 0 is the
//! top of the picture. An [`Initializer`] that was written against another
//! convention declares the difference through its [`Orientation`], and the
//! engine converts to and from it explicitly around the call.

use ndarray::{Array2, ArrayView2};

use crate::angles::AngleSet;
use crate::error::{EstError, Result};
use crate::rotate::quarter_turns;
use crate::Image;

/// Which sinogram axis a collaborator expects along its rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SinogramLayout {
    /// One row per angle (the canonical layout)
    #[default]
    AngleRows,
    /// One row per detector position, one column per angle
    DetectorRows,
}

/// How an external collaborator's axes relate to the canonical frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Orientation {
    /// Layout of the sinogram the collaborator consumes.
    pub layout: SinogramLayout,
    /// Counter-clockwise quarter turns that bring the collaborator's output
    /// image into the canonical frame.
    pub quarter_turns: u8,
}

impl Orientation {
    pub const CANONICAL: Self = Self { layout: SinogramLayout::AngleRows, quarter_turns: 0 };

    pub fn new(layout: SinogramLayout, quarter_turns: u8) -> Self {
        Self { layout, quarter_turns: quarter_turns % 4 }
    }

    /// Present a canonical sinogram in the collaborator's layout.
    pub fn to_collaborator(&self, sinogram: ArrayView2<f64>) -> Array2<f64> {
        match self.layout {
            SinogramLayout::AngleRows    => sinogram.to_owned(),
            SinogramLayout::DetectorRows => sinogram.t().to_owned(),
        }
    }

    /// Bring an image produced by the collaborator into the canonical frame.
    pub fn to_canonical(&self, image: Image) -> Image {
        if self.quarter_turns % 4 == 0 { return image }
        quarter_turns(image.view(), self.quarter_turns)
    }
}

/// Produces the starting image for the iterative loop.
///
/// Typically a direct-inversion method such as filtered backprojection run
/// elsewhere. The only contract is that the image is square and, once
/// turned into the canonical frame, consistent with the forward model.
pub trait Initializer {
    fn initialize(&self, sinogram: ArrayView2<f64>, angles: &AngleSet) -> Result<Image>;

    fn orientation(&self) -> Orientation { Orientation::CANONICAL }
}

/// Flat image of side `num_detectors` filled with `value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uniform {
    pub value: f64,
}

impl Initializer for Uniform {
    fn initialize(&self, sinogram: ArrayView2<f64>, _angles: &AngleSet) -> Result<Image> {
        let side = sinogram.ncols();
        Ok(Image::from_elem((side, side), self.value))
    }
}

/// An estimate computed ahead of time, already in the canonical frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Precomputed(pub Image);

impl Initializer for Precomputed {
    fn initialize(&self, _sinogram: ArrayView2<f64>, _angles: &AngleSet) -> Result<Image> {
        Ok(self.0.clone())
    }
}

/// Adapts a closure into an [`Initializer`] with an explicit orientation.
pub struct FnInitializer<F> {
    f: F,
    orientation: Orientation,
}

impl<F> FnInitializer<F>
where
    F: Fn(ArrayView2<f64>, &AngleSet) -> Result<Image>,
{
    pub fn new(f: F) -> Self { Self { f, orientation: Orientation::CANONICAL } }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
}

impl<F> Initializer for FnInitializer<F>
where
    F: Fn(ArrayView2<f64>, &AngleSet) -> Result<Image>,
{
    fn initialize(&self, sinogram: ArrayView2<f64>, angles: &AngleSet) -> Result<Image> {
        (self.f)(sinogram, angles)
    }

    fn orientation(&self) -> Orientation { self.orientation }
}

/// Run `initializer` on a canonical sinogram and return a canonical,
/// validated image.
pub(crate) fn initial_estimate<I>(initializer: &I, sinogram: ArrayView2<f64>, angles: &AngleSet) -> Result<Image>
where
    I: Initializer + ?Sized,
{
    let orientation = initializer.orientation();
    let adapted = orientation.to_collaborator(sinogram);
    let image = orientation.to_canonical(initializer.initialize(adapted.view(), angles)?);

    let (rows, cols) = image.dim();
    if rows != cols || rows == 0 {
        return Err(EstError::shape("non-empty square image", (rows, cols)));
    }
    if image.iter().any(|v| !v.is_finite()) {
        return Err(EstError::Initializer("initial estimate contains non-finite values".into()));
    }
    Ok(image)
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray::array;

    fn angles() -> AngleSet { AngleSet::equally_sloped(2).unwrap() }

    #[test]
    fn uniform_side_follows_detectors() {
        let sinogram = Array2::<f64>::zeros((2, 6));
        let image = initial_estimate(&Uniform { value: 0.5 }, sinogram.view(), &angles()).unwrap();
        assert_eq!(image, Image::from_elem((6, 6), 0.5));
    }

    #[test]
    fn detector_rows_collaborator_sees_transpose() {
        let sinogram = array![[1.0, 2.0, 3.0],
                              [4.0, 5.0, 6.0]];
        let init = FnInitializer::new(|s: ArrayView2<f64>, _: &AngleSet| {
            assert_eq!(s.dim(), (3, 2));
            assert_eq!(s[[2, 0]], 3.0);
            Ok(Image::zeros((3, 3)))
        })
        .with_orientation(Orientation::new(SinogramLayout::DetectorRows, 0));
        initial_estimate(&init, sinogram.view(), &angles()).unwrap();
    }

    #[test]
    fn output_turned_into_canonical_frame() {
        let produced = array![[1.0, 2.0],
                              [3.0, 4.0]];
        let init = FnInitializer::new(move |_: ArrayView2<f64>, _: &AngleSet| Ok(produced.clone()))
            .with_orientation(Orientation::new(SinogramLayout::AngleRows, 1));
        let sinogram = Array2::<f64>::zeros((2, 2));
        let image = initial_estimate(&init, sinogram.view(), &angles()).unwrap();
        assert_eq!(image, array![[2.0, 4.0], [1.0, 3.0]]);
    }

    #[test]
    fn non_square_estimate_rejected() {
        let init = Precomputed(Image::zeros((4, 5)));
        let sinogram = Array2::<f64>::zeros((2, 4));
        let result = initial_estimate(&init, sinogram.view(), &angles());
        assert!(matches!(result, Err(EstError::ShapeMismatch { .. })));
    }

    #[test]
    fn non_finite_estimate_rejected() {
        let mut image = Image::zeros((3, 3));
        image[[1, 1]] = f64::NAN;
        let sinogram = Array2::<f64>::zeros((2, 3));
        let result = initial_estimate(&Precomputed(image), sinogram.view(), &angles());
        assert!(matches!(result, Err(EstError::Initializer(_))));
    }
}
