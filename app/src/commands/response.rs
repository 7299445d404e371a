//! Offline magnitude response of a parameter set.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use equwu_core::EqProcessor;

use super::{load_params, parse_key_val};

#[derive(Args)]
pub struct ResponseArgs {
    /// Sample rate the filters are designed for
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Number of log-spaced points between 20 Hz and 20 kHz
    #[arg(long, default_value = "31")]
    points: usize,

    /// State file to read parameters from
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Parameter overrides (e.g., "Peak Gain=6")
    #[arg(short, long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, f32)>,

    /// Normalized 0..1 overrides (e.g., "Peak Freq=0.5")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    norm: Vec<(String, f32)>,
}

pub fn run(args: ResponseArgs) -> anyhow::Result<()> {
    let params = Arc::new(load_params(args.state.as_deref(), &args.param, &args.norm)?);
    let mut processor = EqProcessor::new(params);
    processor.prepare_to_play(args.sample_rate as f32, 512)?;

    if processor.rejected_updates() > 0 {
        anyhow::bail!("parameters cannot be realised at {} Hz", args.sample_rate);
    }

    println!("{:?}\n", processor.settings());
    for (frequency, db) in response_table(&processor, args.points) {
        let bar = "#".repeat(((db + 48.0).max(0.0) / 2.0) as usize);
        println!("{:>8.1} Hz {:>7.2} dB  {}", frequency, db, bar);
    }
    Ok(())
}

/// `points` log-spaced frequencies from 20 Hz to 20 kHz with their gain in dB
fn response_table(processor: &EqProcessor, points: usize) -> Vec<(f32, f64)> {
    let points = points.max(2);
    (0..points)
        .map(|i| {
            let t = i as f32 / (points - 1) as f32;
            let frequency = 20.0 * 1000.0_f32.powf(t);
            (frequency, processor.magnitude_db_at(frequency))
        })
        .collect()
}
