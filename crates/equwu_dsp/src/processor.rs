//! Audio Processor Trait
//!
//! The interface a host (or the standalone stream) drives: prepare once per
//! sample-rate/block-size change, then process blocks in place.

use crate::error::DspError;

/// Stream metadata handed to a processor when it is prepared
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessContext {
    pub sample_rate: f32,
    pub channels: usize,
    /// Largest block, in frames, that will ever be passed to `process`
    pub max_block_size: usize,
}

impl ProcessContext {
    pub fn new(sample_rate: f32, channels: usize, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            channels,
            max_block_size,
        }
    }

    /// Stereo context, the only layout the equalizer accepts
    pub fn stereo(sample_rate: f32, max_block_size: usize) -> Self {
        Self::new(sample_rate, 2, max_block_size)
    }

    /// Check the parts of the context a host can get wrong at runtime
    pub fn validate(&self) -> Result<(), DspError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(DspError::InvalidBlockSize);
        }
        Ok(())
    }
}

/// Trait for block-based audio processors
///
/// # Real-time Safety Contract
///
/// Implementors MUST follow these rules in `process()`:
/// - NO heap allocations (no Vec::push, no Box::new, no String)
/// - NO syscalls (no file I/O, no network, no mutex locks)
/// - NO unbounded loops
/// - Constant or O(n) time complexity where n = buffer size
///
/// Violating these rules causes audio dropouts ("glitches").
/// `prepare()` is exempt and may allocate.
pub trait AudioProcessor: Send {
    /// Reset history and size internal state for the given stream
    fn prepare(&mut self, context: ProcessContext) -> Result<(), DspError>;

    /// Process an interleaved buffer in-place
    ///
    /// Buffer format is interleaved: [L0, R0, L1, R1, ...]
    fn process(&mut self, buffer: &mut [f32]);

    /// Reset internal state (delay lines) without changing configuration
    fn reset(&mut self);

    /// Human-readable name for debugging/UI
    fn name(&self) -> &'static str;
}
