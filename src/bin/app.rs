use anyhow::{bail, Context};
use clap::Parser;
use ndarray::prelude::*;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use token_pitch::average_pitch;
use tracing::info;

#[derive(Parser, Debug)]
pub struct Args {
    /// Pitch contours (.npy), shape (batch, frames) or (batch, formants, frames). Frames with no
    /// detected pitch are 0.0
    #[clap(long, short)]
    pitch: PathBuf,
    /// Token durations (.npy), shape (batch, tokens), frames aligned to each token
    #[clap(long, short)]
    durations: PathBuf,
    /// Location to save the per-token pitch targets
    #[clap(short, long, default_value = "pitch_targets.npy")]
    output: PathBuf,
}

/// Loads the pitch array, accepting either the plain (batch, frames) contour a pitch tracker
/// emits or a (batch, formants, frames) array. A 2D contour gets a singleton formant axis so the
/// rest of the code only deals with one shape.
fn load_pitch(path: &Path) -> anyhow::Result<Array3<f32>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let pitch = ArrayD::<f32>::read_npy(file).context("reading pitch array")?;
    match pitch.ndim() {
        2 => Ok(pitch.into_dimensionality::<Ix2>()?.insert_axis(Axis(1))),
        3 => Ok(pitch.into_dimensionality::<Ix3>()?),
        n => bail!("expected a 2 or 3 dimensional pitch array, got {} dimensions", n),
    }
}

fn main() -> anyhow::Result<()> {
    token_pitch::setup_logging();
    let args = Args::parse();

    info!("Loading arrays");

    let pitch = load_pitch(&args.pitch)?;
    let file =
        File::open(&args.durations).with_context(|| format!("opening {}", args.durations.display()))?;
    let durations = Array2::<i64>::read_npy(file).context("reading durations array")?;

    info!(
        "Averaging pitch for {} utterances ({} tokens each)",
        pitch.shape()[0],
        durations.shape()[1]
    );
    let targets = average_pitch(pitch.view(), durations.view())?;

    let writer = BufWriter::new(File::create(&args.output)?);
    targets.write_npy(writer).context("writing pitch targets")?;
    info!("Wrote pitch targets to {}", args.output.display());

    Ok(())
}
