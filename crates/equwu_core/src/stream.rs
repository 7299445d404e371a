//! Audio Stream Management
//!
//! Standalone duplex transport: CPAL capture callback -> `rtrb` ring buffer
//! -> CPAL output callback, which runs the equalizer and writes meters.
//!
//! ```text
//!   Input device ──capture cb──▶ rtrb ──output cb──▶ EqProcessor ──▶ Output device
//!                                                        │
//!                                    ParameterStore ─────┘ (atomics, per block)
//! ```
//!
//! Both callbacks are real-time: no allocation, no locks, no logging.
//! Events leave through `try_send` only.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Stream, StreamConfig as CpalStreamConfig};
use crossbeam_channel::Sender;
use equwu_dsp::CHANNELS;
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{debug, info};

use crate::config::{EngineConfig, SUPPORTED_CHANNELS};
use crate::device::AudioDevice;
use crate::error::{EngineError, EngineResult};
use crate::message::Event;
use crate::params::ParameterStore;
use crate::processor::EqProcessor;

/// Level meters are published roughly this many times per second
const LEVEL_UPDATES_PER_SECOND: u32 = 10;

/// Shared state between audio callbacks and control thread
pub struct SharedState {
    /// Peak level left channel (f32 bits; there is no AtomicF32)
    peak_left_bits: AtomicU32,

    /// Peak level right channel
    peak_right_bits: AtomicU32,

    underruns: AtomicU64,
    overflows: AtomicU64,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            peak_left_bits: AtomicU32::new(0.0_f32.to_bits()),
            peak_right_bits: AtomicU32::new(0.0_f32.to_bits()),
            underruns: AtomicU64::new(0),
            overflows: AtomicU64::new(0),
        }
    }

    pub fn set_peaks(&self, left: f32, right: f32) {
        self.peak_left_bits.store(left.to_bits(), Ordering::Relaxed);
        self.peak_right_bits.store(right.to_bits(), Ordering::Relaxed);
    }

    pub fn peaks(&self) -> (f32, f32) {
        (
            f32::from_bits(self.peak_left_bits.load(Ordering::Relaxed)),
            f32::from_bits(self.peak_right_bits.load(Ordering::Relaxed)),
        )
    }

    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn overflows(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture side of the ring buffer
struct CaptureWriter {
    producer: Producer<f32>,
    shared: Arc<SharedState>,
    events: Sender<Event>,
}

impl CaptureWriter {
    /// Push whole frames; whatever does not fit is dropped
    fn write(&mut self, data: &[f32]) {
        let len = data.len().min(self.producer.slots()) / CHANNELS * CHANNELS;

        if let Ok(mut chunk) = self.producer.write_chunk(len) {
            let (first, second) = chunk.as_mut_slices();
            let split = first.len();
            first.copy_from_slice(&data[..split]);
            second.copy_from_slice(&data[split..len]);
            chunk.commit_all();
        }

        if len < data.len() {
            self.shared.overflows.fetch_add(1, Ordering::Relaxed);
            let _ = self.events.try_send(Event::BufferOverflow);
        }
    }
}

/// Output side: pull, equalize, meter
struct OutputRenderer {
    consumer: Consumer<f32>,
    processor: EqProcessor,
    shared: Arc<SharedState>,
    events: Sender<Event>,
    /// Largest interleaved slice the processor was prepared for
    block_samples: usize,
    level_interval_frames: usize,
    frames_since_level: usize,
}

impl OutputRenderer {
    fn render(&mut self, data: &mut [f32]) {
        let len = data.len().min(self.consumer.slots()) / CHANNELS * CHANNELS;

        if let Ok(chunk) = self.consumer.read_chunk(len) {
            let (first, second) = chunk.as_slices();
            data[..first.len()].copy_from_slice(first);
            data[first.len()..len].copy_from_slice(second);
            chunk.commit_all();
        }

        if len < data.len() {
            data[len..].fill(0.0);
            self.shared.underruns.fetch_add(1, Ordering::Relaxed);
            let _ = self.events.try_send(Event::BufferUnderrun);
        }

        // The backend may hand us more than the prepared block size
        for block in data.chunks_mut(self.block_samples) {
            self.processor.process_interleaved(block);
        }

        let (peak_l, peak_r) = data
            .chunks_exact(CHANNELS)
            .fold((0.0_f32, 0.0_f32), |(l, r), frame| {
                (l.max(frame[0].abs()), r.max(frame[1].abs()))
            });
        self.shared.set_peaks(peak_l, peak_r);

        self.frames_since_level += data.len() / CHANNELS;
        if self.frames_since_level >= self.level_interval_frames {
            self.frames_since_level = 0;
            let _ = self.events.try_send(Event::LevelUpdate {
                left: peak_l,
                right: peak_r,
            });
        }
    }
}

/// Build the ring buffer and both callback halves around a prepared processor
fn build_pipeline(
    config: &EngineConfig,
    params: Arc<ParameterStore>,
    shared: &Arc<SharedState>,
    events: &Sender<Event>,
) -> EngineResult<(CaptureWriter, OutputRenderer)> {
    let stream = &config.stream;
    let (mut producer, consumer) = RingBuffer::<f32>::new(config.ring_buffer_frames * CHANNELS);

    // One buffer of silence so the output does not start on an underrun
    let prefill = (stream.buffer_size as usize * CHANNELS).min(producer.slots());
    if let Ok(chunk) = producer.write_chunk(prefill) {
        chunk.commit_all();
    }

    let mut processor = EqProcessor::new(params);
    processor.prepare_to_play(stream.sample_rate as f32, stream.buffer_size as usize)?;

    let writer = CaptureWriter {
        producer,
        shared: Arc::clone(shared),
        events: events.clone(),
    };
    let renderer = OutputRenderer {
        consumer,
        processor,
        shared: Arc::clone(shared),
        events: events.clone(),
        block_samples: stream.buffer_size as usize * CHANNELS,
        level_interval_frames: (stream.sample_rate / LEVEL_UPDATES_PER_SECOND) as usize,
        frames_since_level: 0,
    };
    Ok((writer, renderer))
}

/// A running duplex stream; dropping it stops audio
pub struct AudioStream {
    // Held to keep audio flowing
    #[allow(dead_code)]
    capture_stream: Stream,

    #[allow(dead_code)]
    output_stream: Stream,

    shared: Arc<SharedState>,
    config: EngineConfig,
    events: Sender<Event>,
}

impl AudioStream {
    /// Open `input` and `output` in stereo and run the equalizer between them
    ///
    /// # Arguments
    ///
    /// * `config` - Stream and ring buffer configuration
    /// * `input` - Device to capture from
    /// * `output` - Device to play the processed audio on
    /// * `params` - Parameter store read by the output callback every block
    /// * `events` - Sink for stream events; use a bounded channel
    pub fn new_duplex(
        config: EngineConfig,
        input: &AudioDevice,
        output: &AudioDevice,
        params: Arc<ParameterStore>,
        events: Sender<Event>,
    ) -> EngineResult<Self> {
        config.validate()?;
        if !(input.supports_stereo() && output.supports_stereo()) {
            return Err(EngineError::UnsupportedLayout {
                input: input.max_channels,
                output: output.max_channels,
            });
        }

        let shared = Arc::new(SharedState::new());
        let (mut writer, mut renderer) = build_pipeline(&config, params, &shared, &events)?;

        let cpal_config = CpalStreamConfig {
            channels: SUPPORTED_CHANNELS,
            sample_rate: cpal::SampleRate(config.stream.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.stream.buffer_size),
        };

        let err_sender = events.clone();
        let capture_stream = input
            .open()?
            .build_input_stream(
                &cpal_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| writer.write(data),
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None, // No timeout
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;
        debug!("Capture stream built on '{}'", input.name);

        let err_sender = events.clone();
        let output_stream = output
            .open()?
            .build_output_stream(
                &cpal_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| renderer.render(data),
                move |err| {
                    let _ = err_sender.try_send(Event::error(err));
                },
                None,
            )
            .map_err(|e| EngineError::StreamBuildError(e.to_string()))?;
        debug!("Output stream built on '{}'", output.name);

        capture_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| EngineError::StreamPlayError(e.to_string()))?;

        info!(
            "Stream running: '{}' -> '{}' at {} Hz, {} frames ({:.1} ms)",
            input.name,
            output.name,
            config.stream.sample_rate,
            config.stream.buffer_size,
            config.stream.latency_ms()
        );
        let _ = events.try_send(Event::Started {
            sample_rate: config.stream.sample_rate,
            buffer_size: config.stream.buffer_size,
        });

        Ok(Self {
            capture_stream,
            output_stream,
            shared,
            config,
            events,
        })
    }

    /// Current peak levels (for UI meters)
    pub fn peaks(&self) -> (f32, f32) {
        self.shared.peaks()
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for AudioStream {
    fn drop(&mut self) {
        info!(
            "Stream stopped ({} underruns, {} overflows)",
            self.shared.underruns(),
            self.shared.overflows()
        );
        let _ = self.events.try_send(Event::Stopped);
    }
}
