//! Reading and writing arrays in NumPy formats.
//!
//! Sinogram archives (`.npz`) hold a 2D array under `sinogram` and,
//! optionally, the projection angles in degrees under `angles`. Images are
//! stored as single `.npy` arrays.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::Array1;
use ndarray_npy::{read_npy, write_npy, NpzReader, NpzWriter};
use serde::Serialize;

use crate::angles::AngleSet;
use crate::engine::{IterationRecord, Reconstruction, Termination};
use crate::error::{EstError, Result};
use crate::{Image, Sinogram};

const SINOGRAM_KEY: &str = "sinogram";
const ANGLES_KEY: &str = "angles";

pub fn read_sinogram_npz(path: &Path) -> Result<(Sinogram, Option<AngleSet>)> {
    let mut npz = NpzReader::new(File::open(path)?)?;
    let names = npz.names()?;

    let sinogram_name = entry_name(&names, SINOGRAM_KEY)
        .ok_or_else(|| EstError::invalid(format!("{} has no '{SINOGRAM_KEY}' array", path.display())))?;
    let sinogram: Sinogram = npz.by_name(&sinogram_name)?;

    let angles = match entry_name(&names, ANGLES_KEY) {
        Some(name) => {
            let degrees: Array1<f64> = npz.by_name(&name)?;
            Some(AngleSet::from_degrees(degrees.to_vec())?)
        }
        None => None,
    };
    Ok((sinogram, angles))
}

pub fn write_sinogram_npz(path: &Path, sinogram: &Sinogram, angles: &AngleSet) -> Result<()> {
    let mut npz = NpzWriter::new(File::create(path)?);
    npz.add_array(SINOGRAM_KEY, sinogram)?;
    npz.add_array(ANGLES_KEY, &Array1::from(angles.as_slice().to_vec()))?;
    npz.finish()?;
    Ok(())
}

pub fn read_image_npy(path: &Path) -> Result<Image> {
    Ok(read_npy(path)?)
}

pub fn write_image_npy(path: &Path, image: &Image) -> Result<()> {
    write_npy(path, image)?;
    Ok(())
}

#[derive(Serialize)]
struct TraceFile<'a> {
    termination: Termination,
    trace: &'a [IterationRecord],
}

/// Write the termination state and per-iteration errors as JSON.
pub fn write_trace_json(path: &Path, reconstruction: &Reconstruction) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    let contents = TraceFile { termination: reconstruction.termination, trace: &reconstruction.trace };
    serde_json::to_writer_pretty(file, &contents)?;
    Ok(())
}

// Archives written by NumPy carry a `.npy` suffix on every entry
fn entry_name(names: &[String], key: &str) -> Option<String> {
    let suffixed = format!("{key}.npy");
    names.iter().find(|n| *n == key || **n == suffixed).cloned()
}
