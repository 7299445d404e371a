//! Real-time equalizing between two devices.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use equwu_core::{AudioDevice, AudioStream, DeviceType, EngineConfig, Event, StreamConfig};
use tracing::{error, warn};

use super::{load_params, parse_key_val, save_params};

#[derive(Args)]
pub struct RunArgs {
    /// Input device name (default input if omitted)
    #[arg(long)]
    input_device: Option<String>,

    /// Output device name (default output if omitted)
    #[arg(long)]
    output_device: Option<String>,

    /// Sample rate
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Buffer size in frames
    #[arg(long, default_value = "512")]
    buffer_size: u32,

    /// Ring buffer capacity, in multiples of the buffer size
    #[arg(long, default_value = "4")]
    ring_buffers: usize,

    /// State file loaded on start and written on exit
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Parameter overrides (e.g., "Peak Gain=6")
    #[arg(short, long, value_parser = parse_key_val, number_of_values = 1)]
    param: Vec<(String, f32)>,

    /// Normalized 0..1 overrides (e.g., "Peak Freq=0.5")
    #[arg(long, value_parser = parse_key_val, number_of_values = 1)]
    norm: Vec<(String, f32)>,
}

fn resolve(name: Option<&str>, device_type: DeviceType) -> anyhow::Result<AudioDevice> {
    Ok(match (name, device_type) {
        (Some(name), _) => AudioDevice::find_by_name(name, device_type)?,
        (None, DeviceType::Input) => AudioDevice::default_input()?,
        (None, DeviceType::Output) => AudioDevice::default_output()?,
    })
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let params = Arc::new(load_params(args.state.as_deref(), &args.param, &args.norm)?);

    let config = EngineConfig {
        stream: StreamConfig {
            sample_rate: args.sample_rate,
            buffer_size: args.buffer_size,
            ..Default::default()
        },
        ring_buffer_frames: args.buffer_size as usize * args.ring_buffers,
    };

    let input = resolve(args.input_device.as_deref(), DeviceType::Input)?;
    let output = resolve(args.output_device.as_deref(), DeviceType::Output)?;

    println!("Real-time stereo equalizer");
    println!("  Input:  {}", input.name);
    println!("  Output: {}", output.name);
    println!("  Sample rate: {} Hz", config.stream.sample_rate);
    println!(
        "  Buffer size: {} frames ({:.1} ms)",
        config.stream.buffer_size,
        config.stream.latency_ms()
    );
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let (sender, receiver) = crossbeam_channel::bounded(256);
    let stream = AudioStream::new_duplex(config, &input, &output, Arc::clone(&params), sender)?;

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(Event::Error { message }) => error!("Stream error: {}", message),
            Ok(Event::BufferUnderrun) => warn!("Buffer underrun"),
            Ok(Event::BufferOverflow) => warn!("Buffer overflow"),
            Ok(Event::LevelUpdate { left, right }) => {
                print!("\r  L {:>6.1} dB   R {:>6.1} dB ", to_db(left), to_db(right));
                let _ = std::io::stdout().flush();
            }
            Ok(_) | Err(_) => {}
        }
    }

    println!("\nStopping...");
    drop(stream);

    if let Some(path) = &args.state {
        save_params(&params, path)?;
    }
    Ok(())
}

fn to_db(level: f32) -> f32 {
    20.0 * level.max(1e-6).log10()
}
