use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kanji_lookup::{Dataset, RecognizerConfig};
use log::{info, warn};

#[derive(Parser)]
#[command(name = "dataset_convert", about = "Packs a JSON stroke dataset into the binary form")]
struct Cli {
    /// JSON dataset: [["字", 6, [[[x, y], ...], ...]], ...]
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (bincode)
    #[arg(short, long)]
    output: PathBuf,

    /// Moment-normalize and resample reference strokes before packing
    #[arg(long)]
    prepare: bool,

    /// Feature-point interval used with --prepare
    #[arg(long, default_value = "20")]
    interval: f64,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let file = File::open(&cli.input).with_context(|| format!("failed to open {}", cli.input.display()))?;
    let mut dataset = Dataset::from_json_reader(BufReader::new(file))?;
    info!("parsed {} entries from {}", dataset.len(), cli.input.display());

    for ix in dataset.stroke_count_mismatches() {
        let entry = &dataset[ix];
        warn!(
            "entry {} ({}) declares {} strokes but has {}",
            ix,
            entry.label,
            entry.stroke_count,
            entry.pattern.len()
        );
    }

    if cli.prepare {
        let config = RecognizerConfig {
            feature_interval: cli.interval,
            ..RecognizerConfig::default()
        };
        dataset = dataset.prepare(&config);
        info!("prepared reference patterns at interval {}", cli.interval);
    }

    let file = File::create(&cli.output).with_context(|| format!("failed to create {}", cli.output.display()))?;
    let mut writer = BufWriter::new(file);
    dataset.write_bincode(&mut writer)?;
    writer.flush()?;
    info!("wrote {}", cli.output.display());
    Ok(())
}
