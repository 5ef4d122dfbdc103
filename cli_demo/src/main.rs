use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use kanji_lookup::{Dataset, Pattern, Recognizer, RecognizerConfig};
use serde_derive::Deserialize;

#[derive(Parser)]
#[command(name = "cli_demo", about = "Replays recorded handwriting against a dataset and counts correct first guesses")]
struct Cli {
    /// Dataset path (.json, or .bin as written by dataset_convert)
    #[arg(short, long)]
    dataset: PathBuf,

    /// Recorded inputs, one JSON object per line: {"char": "字", "strokes": [[[x, y], ...], ...]}
    #[arg(short, long)]
    inputs: PathBuf,

    /// Evaluation cycles over all inputs
    #[arg(long, default_value = "1")]
    iters: usize,

    /// Normalize and resample the dataset before matching (for raw reference strokes)
    #[arg(long)]
    prepare: bool,

    /// Coarse candidates re-ranked by the fine pass
    #[arg(long, default_value = "100")]
    shortlist: usize,
}

#[derive(Deserialize)]
struct Input {
    char: String,
    strokes: Pattern,
}

fn read_inputs(path: &Path) -> Result<Vec<Input>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut res: Vec<Input> = Vec::new();
    for (ix, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let input: Input = serde_json::from_str(&line).with_context(|| format!("bad input on line {}", ix + 1))?;
        res.push(input);
    }
    Ok(res)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = RecognizerConfig {
        coarse_shortlist: cli.shortlist,
        ..RecognizerConfig::default()
    };
    let mut dataset = Dataset::open(&cli.dataset).with_context(|| format!("failed to load {}", cli.dataset.display()))?;
    if cli.prepare {
        dataset = dataset.prepare(&config);
    }
    let mismatches = dataset.stroke_count_mismatches();
    if !mismatches.is_empty() {
        log::warn!("{} dataset entries declare a stroke count their pattern does not have", mismatches.len());
    }
    let recognizer = Recognizer::with_config(dataset, config);

    println!("Loading evaluation data.");
    let inputs = read_inputs(&cli.inputs)?;
    println!("Loaded {} inputs; starting {} cycles of evaluation.", inputs.len(), cli.iters);
    let start = Instant::now();
    let mut guessed = 0;
    for _ in 0..cli.iters {
        for input in &inputs {
            let matches = recognizer.recognize_with_scores(&input.strokes);
            if matches.first().map(|m| &m.label) == Some(&input.char) {
                guessed += 1;
            } else if log::log_enabled!(log::Level::Debug) {
                log::debug!("missed {}: {}", input.char, serde_json::to_string(&matches)?);
            }
        }
    }
    let duration = start.elapsed();
    println!("Finished in {:?}. Correct guesses: {}.", duration, guessed);
    Ok(())
}
