use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use est_core::io::{read_image_npy, read_sinogram_npz, write_image_npy, write_sinogram_npz, write_trace_json};
use est_core::{AngleSet, EstConfig, ForwardProjector, Precomputed, Reconstructor, RotationProjector, Uniform};

/// Equally sloped tomography from the command line.
///
/// Sinogram archives (.npz) hold:
///   - key "sinogram": 2D array (projections, detectors) of f64
///   - key "angles":   optional 1D array (projections,) of f64 degrees
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate the sinogram of an image (.npy)
    Project(ProjectArgs),
    /// Reconstruct an image from a sinogram archive (.npz)
    Reconstruct(ReconstructArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Sampling {
    /// Sines of the angles equally spaced over [-1, 1]
    EquallySloped,
    /// Angles equally spaced over [-90, 90] degrees
    EquallySpaced,
}

#[derive(clap::Args, Debug)]
struct ProjectArgs {
    /// Square image to project (.npy)
    #[arg(long)]
    image: PathBuf,

    /// Number of projection angles
    #[arg(long)]
    num_projections: usize,

    /// Detector positions per projection [default: image side]
    #[arg(long)]
    num_detectors: Option<usize>,

    #[arg(long, value_enum, default_value_t = Sampling::EquallySloped)]
    sampling: Sampling,

    /// Output sinogram archive (.npz)
    #[arg(long)]
    output: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ReconstructArgs {
    /// Sinogram archive (.npz)
    #[arg(long)]
    input: PathBuf,

    /// Initial estimate (.npy), e.g. a filtered backprojection
    #[arg(long, conflicts_with = "uniform")]
    initial: Option<PathBuf>,

    /// Start from a flat image with this value instead
    #[arg(long, default_value_t = 0.0)]
    uniform: f64,

    /// JSON file with num_iterations, tolerance and learning_rate
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    num_iterations: Option<usize>,

    #[arg(long)]
    tolerance: Option<f64>,

    #[arg(long)]
    learning_rate: Option<f64>,

    /// Maximum number of rayon threads [default: all cores]
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Output path for the reconstructed image (.npy)
    #[arg(long)]
    output: PathBuf,

    /// Also write the per-iteration errors as JSON
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Project(args) => project(args),
        Command::Reconstruct(args) => reconstruct(args),
    }
}

fn project(args: ProjectArgs) -> Result<()> {
    let image = read_image_npy(&args.image)
        .with_context(|| format!("Failed to read image {:?}", args.image))?;
    let num_detectors = args.num_detectors.unwrap_or(image.ncols());
    let angles = match args.sampling {
        Sampling::EquallySloped => AngleSet::equally_sloped(args.num_projections),
        Sampling::EquallySpaced => AngleSet::equally_spaced(args.num_projections),
    }?;

    info!(
        "Projecting {}x{} image at {} angles onto {} detectors",
        image.nrows(), image.ncols(), angles.len(), num_detectors
    );
    let sinogram = RotationProjector.project(image.view(), &angles, num_detectors);

    write_sinogram_npz(&args.output, &sinogram, &angles)
        .with_context(|| format!("Failed to write sinogram {:?}", args.output))?;
    info!("Sinogram written to {:?}", args.output);
    Ok(())
}

fn reconstruct(args: ReconstructArgs) -> Result<()> {
    // --- Parameters: file, then explicit flags ---
    let mut config = match &args.config {
        Some(path) => EstConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => EstConfig::default(),
    };
    if let Some(n) = args.num_iterations { config.num_iterations = n }
    if let Some(t) = args.tolerance      { config.tolerance      = t }
    if let Some(l) = args.learning_rate  { config.learning_rate  = l }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure rayon thread pool")?;
    }

    // --- Load sinogram (+ angles) ---
    let (sinogram, angles) = read_sinogram_npz(&args.input)
        .with_context(|| format!("Failed to read sinogram archive {:?}", args.input))?;
    let angles = match angles {
        Some(angles) => angles,
        None => {
            info!("No angles stored in {:?}: assuming equally sloped sampling", args.input);
            AngleSet::equally_sloped(sinogram.nrows())?
        }
    };

    // --- Run EST ---
    let reconstructor = Reconstructor::new(config);
    let result = match &args.initial {
        Some(path) => {
            let initial = read_image_npy(path)
                .with_context(|| format!("Failed to read initial estimate {:?}", path))?;
            reconstructor.reconstruct(sinogram.view(), &angles, &Precomputed(initial))
        }
        None => reconstructor.reconstruct(sinogram.view(), &angles, &Uniform { value: args.uniform }),
    }?;
    info!("{:?} after {} iterations", result.termination, result.trace.len());

    // --- Save ---
    write_image_npy(&args.output, &result.image)
        .with_context(|| format!("Failed to write output NPY {:?}", args.output))?;
    info!("Reconstruction written to {:?}", args.output);

    if let Some(path) = &args.trace {
        write_trace_json(path, &result)
            .with_context(|| format!("Failed to write trace {:?}", path))?;
    }
    Ok(())
}
