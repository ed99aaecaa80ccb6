use crate::error::{EstError, Result};

/// Ordered projection angles, in degrees.
///
/// Position `k` in the set corresponds to row `k` of any sinogram measured
/// or simulated with it, so the same set must be used for acquisition and
/// reconstruction.
#[derive(Clone, Debug, PartialEq)]
pub struct AngleSet(Vec<f64>);

impl AngleSet {
    /// `n` angles whose sines are equally spaced over [-1, 1].
    ///
    /// `angle[k] = asin(-1 + 2k/(n-1))`, converted to degrees. This spaces
    /// the projections evenly in Fourier space rather than in angle, which
    /// is what distinguishes equally sloped tomography from ordinary
    /// angular sampling.
    pub fn equally_sloped(n: usize) -> Result<Self> {
        check_count(n)?;
        let step = 2.0 / (n - 1) as f64;
        let angles = (0..n)
            .map(|k| {
                // Pin the last sample to exactly +1, as a linspace would
                let slope = if k == n - 1 { 1.0 } else { -1.0 + k as f64 * step };
                slope.clamp(-1.0, 1.0).asin().to_degrees()
            })
            .collect();
        Ok(Self(angles))
    }

    /// `n` angles evenly spaced over [-90, 90] degrees, both ends included.
    pub fn equally_spaced(n: usize) -> Result<Self> {
        check_count(n)?;
        let last = (n - 1) as f64;
        Ok(Self((0..n).map(|k| -90.0 + 180.0 * k as f64 / last).collect()))
    }

    /// Wrap angles obtained elsewhere, e.g. stored next to a sinogram.
    pub fn from_degrees(angles: Vec<f64>) -> Result<Self> {
        if let Some(bad) = angles.iter().find(|a| !a.is_finite()) {
            return Err(EstError::invalid(format!("angle {bad} is not finite")));
        }
        Ok(Self(angles))
    }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, k: usize) -> Option<f64> { self.0.get(k).copied() }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ { self.0.iter().copied() }

    pub fn as_slice(&self) -> &[f64] { &self.0 }
}

fn check_count(n: usize) -> Result<()> {
    if n < 2 {
        return Err(EstError::invalid(format!(
            "at least 2 projection angles are required, got {n}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;

    #[rstest(/**/ n, expected,
             case(2, vec![-90.0, 90.0]),
             case(3, vec![-90.0, 0.0, 90.0]),
             case(5, vec![-90.0, -30.0, 0.0, 30.0, 90.0]),
    )]
    fn equally_sloped_hand_picked(n: usize, expected: Vec<f64>) {
        let angles = AngleSet::equally_sloped(n).unwrap();
        assert_eq!(angles.len(), n);
        for (got, want) in angles.iter().zip(expected) {
            assert_float_eq!(got, want, abs <= 1e-9);
        }
    }

    #[test]
    fn sines_are_equally_spaced() {
        let angles = AngleSet::equally_sloped(17).unwrap();
        let sines: Vec<f64> = angles.iter().map(|a| a.to_radians().sin()).collect();
        for pair in sines.windows(2) {
            assert_float_eq!(pair[1] - pair[0], 2.0 / 16.0, abs <= 1e-12);
        }
    }

    #[rstest(n, case(0), case(1))]
    fn too_few_angles_rejected(n: usize) {
        assert!(matches!(AngleSet::equally_sloped(n), Err(EstError::InvalidConfiguration(_))));
        assert!(matches!(AngleSet::equally_spaced(n), Err(EstError::InvalidConfiguration(_))));
    }

    #[test]
    fn equally_spaced_endpoints() {
        let angles = AngleSet::equally_spaced(7).unwrap();
        assert_eq!(angles.get(0), Some(-90.0));
        assert_eq!(angles.get(3), Some(0.0));
        assert_eq!(angles.get(6), Some(90.0));
    }

    #[test]
    fn non_finite_angles_rejected() {
        assert!(AngleSet::from_degrees(vec![0.0, f64::NAN]).is_err());
        assert!(AngleSet::from_degrees(vec![0.0, 12.5]).is_ok());
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn equally_sloped_is_symmetric(n in 2..400_usize) {
            let angles = AngleSet::equally_sloped(n).unwrap();
            let a = angles.as_slice();
            for k in 0..n {
                prop_assert!((a[k] + a[n - 1 - k]).abs() < 1e-9);
            }
        }

        #[test]
        fn equally_sloped_is_increasing(n in 2..400_usize) {
            let angles = AngleSet::equally_sloped(n).unwrap();
            prop_assert!(angles.as_slice().windows(2).all(|w| w[0] < w[1]));
        }
    }
}
