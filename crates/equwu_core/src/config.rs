//! Stream Configuration

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Only channel layout the equalizer processes
pub const SUPPORTED_CHANNELS: u16 = 2;

/// Whether an input/output channel pairing can be processed
///
/// Input and output must match and be stereo; mono and surround are refused.
pub fn is_layout_supported(input_channels: u16, output_channels: u16) -> bool {
    input_channels == SUPPORTED_CHANNELS && output_channels == SUPPORTED_CHANNELS
}

/// Audio stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Sample rate in Hz (e.g., 44100, 48000, 96000)
    pub sample_rate: u32,

    /// Number of audio channels; always 2
    pub channels: u16,

    /// Buffer size in frames (lower = less latency, higher = more stability)
    pub buffer_size: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: SUPPORTED_CHANNELS,
            buffer_size: 512,
        }
    }
}

impl StreamConfig {
    /// Calculate latency in milliseconds for this configuration
    pub fn latency_ms(&self) -> f32 {
        (self.buffer_size as f32 / self.sample_rate as f32) * 1000.0
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.sample_rate < 8000 || self.sample_rate > 192000 {
            return Err(EngineError::ConfigError(format!(
                "Invalid sample rate: {}",
                self.sample_rate
            )));
        }
        if !is_layout_supported(self.channels, self.channels) {
            return Err(EngineError::UnsupportedLayout {
                input: self.channels,
                output: self.channels,
            });
        }
        if self.buffer_size < 32 || self.buffer_size > 8192 {
            return Err(EngineError::ConfigError(format!(
                "Invalid buffer size: {}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}

/// Overall engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stream configuration
    pub stream: StreamConfig,

    /// Capture -> output ring buffer capacity in frames
    pub ring_buffer_frames: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            // 4 buffers worth of ring buffer capacity
            ring_buffer_frames: 512 * 4,
        }
    }
}

impl EngineConfig {
    /// Create config optimized for low latency
    pub fn low_latency() -> Self {
        Self {
            stream: StreamConfig {
                buffer_size: 128, // ~2.6ms latency
                ..Default::default()
            },
            ring_buffer_frames: 128 * 8,
        }
    }

    /// Create config optimized for stability
    pub fn stable() -> Self {
        Self {
            stream: StreamConfig {
                buffer_size: 1024, // ~21ms latency
                ..Default::default()
            },
            ring_buffer_frames: 1024 * 4,
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.stream.validate()?;
        if self.ring_buffer_frames < self.stream.buffer_size as usize {
            return Err(EngineError::ConfigError(format!(
                "Ring buffer of {} frames cannot hold one {}-frame buffer",
                self.ring_buffer_frames, self.stream.buffer_size
            )));
        }
        Ok(())
    }
}
