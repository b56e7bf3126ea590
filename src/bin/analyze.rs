use anyhow::Context;
use clap::Parser;
use ndarray::Array1;
use ndarray_npy::ReadNpyExt;
use std::fs::File;
use std::path::PathBuf;
use token_pitch::manifest::Manifest;
use token_pitch::stats::StatsGenerator;

#[derive(Parser, Debug)]
pub struct Args {
    /// Utterance manifest, one `id|pitch.npy|durations.npy` per line
    #[clap(long, short, default_value = "./data/manifest.txt")]
    manifest: PathBuf,
    /// Location to save the analysis report
    #[clap(short, long, default_value = "analysis.json")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    token_pitch::setup_logging();
    let args = Args::parse();

    let manifest = Manifest::load(&args.manifest)?;
    println!("Manifest size (utterances): {}", manifest.entries.len());
    if !manifest.validate() {
        anyhow::bail!("manifest failed validation");
    }

    let mut stats = StatsGenerator::default();

    for entry in &manifest.entries {
        let file = File::open(&entry.pitch_path)
            .with_context(|| format!("opening pitch for {}", entry.id))?;
        let pitch = Array1::<f32>::read_npy(file)
            .with_context(|| format!("reading pitch for {}", entry.id))?;

        let file = File::open(&entry.durations_path)
            .with_context(|| format!("opening durations for {}", entry.id))?;
        let durations = Array1::<i64>::read_npy(file)
            .with_context(|| format!("reading durations for {}", entry.id))?;

        stats.push_utterance(&entry.id, pitch.view(), durations.view())?;
    }
    let report = stats.generate_report();

    println!("Corpus voiced ratio: {:.3}", report.voiced_ratio);
    println!("Corpus pitch mean (Hz): {:.2}", report.pitch_mean);
    println!("Corpus pitch std (Hz): {:.2}", report.pitch_std);

    let report = serde_json::to_string_pretty(&report)?;
    std::fs::write(&args.output, report)?;

    Ok(())
}
