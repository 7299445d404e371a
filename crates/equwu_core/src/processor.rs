//! Equalizer Processor
//!
//! Lifecycle glue between a host (or the standalone stream) and the DSP
//! chain: prepare/release, per-block parameter snapshots and the saved
//! state blob.
//!
//! # Real-time Safety
//!
//! `process_planar` / `process_interleaved` only read atomics, design
//! coefficients into fixed-size values and filter. Logging happens in the
//! lifecycle calls, never in the process calls.

use std::sync::Arc;

use equwu_dsp::{AudioProcessor, ChainSettings, DspError, ProcessContext, StereoProcessor};
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::params::ParameterStore;
use crate::state::PluginState;

pub struct EqProcessor {
    params: Arc<ParameterStore>,
    stereo: StereoProcessor,
    /// Store generation the installed coefficients were designed from
    last_generation: Option<u64>,
    coefficient_updates: u64,
    rejected_updates: u64,
}

impl EqProcessor {
    pub const NAME: &'static str = "EQUwU";

    pub fn new(params: Arc<ParameterStore>) -> Self {
        Self {
            params,
            stereo: StereoProcessor::new(),
            last_generation: None,
            coefficient_updates: 0,
            rejected_updates: 0,
        }
    }

    pub fn params(&self) -> &Arc<ParameterStore> {
        &self.params
    }

    /// Prepare for a stereo stream
    ///
    /// Clears all filter history and designs fresh coefficients from the
    /// current parameters before the next block.
    pub fn prepare_to_play(&mut self, sample_rate: f32, max_block_size: usize) -> EngineResult<()> {
        info!(
            "Preparing {} at {} Hz, max block {} frames",
            Self::NAME,
            sample_rate,
            max_block_size
        );
        self.prepare_context(ProcessContext::stereo(sample_rate, max_block_size))?;
        Ok(())
    }

    fn prepare_context(&mut self, context: ProcessContext) -> Result<(), DspError> {
        self.stereo.prepare(context)?;

        let rejected = self.rejected_updates;
        self.last_generation = None;
        self.refresh();

        if self.rejected_updates > rejected {
            warn!(
                "Current parameters cannot be designed at {} Hz; keeping the last valid design",
                context.sample_rate
            );
        }
        Ok(())
    }

    /// Stream stopped; drop filter history
    ///
    /// Nothing is allocated after `prepare_to_play`, so there is nothing to
    /// free. The processor stays prepared.
    pub fn release_resources(&mut self) {
        debug!("Releasing {} resources", Self::NAME);
        if self.stereo.is_prepared() {
            self.stereo.reset();
        }
    }

    pub fn is_prepared(&self) -> bool {
        self.stereo.is_prepared()
    }

    /// Redesign coefficients if the parameters moved since the last block
    ///
    /// A rejected design keeps the previous coefficients and is not retried
    /// until the parameters change again.
    fn refresh(&mut self) {
        let generation = self.params.generation();
        if self.last_generation == Some(generation) {
            return;
        }

        let settings = self.params.chain_settings();
        match self.stereo.update(&settings) {
            Ok(()) => self.coefficient_updates += 1,
            Err(_) => self.rejected_updates += 1,
        }
        self.last_generation = Some(generation);
    }

    /// Process separate left/right buffers in place
    ///
    /// # Panics
    /// Panics if unprepared, if the channels differ in length, or if the
    /// block exceeds the prepared maximum
    pub fn process_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.refresh();
        self.stereo.process_planar(left, right);
    }

    /// Process an interleaved stereo buffer in place
    ///
    /// # Panics
    /// Same conditions as [`process_planar`](Self::process_planar), plus a
    /// buffer holding a partial frame
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        self.refresh();
        self.stereo.process_interleaved(buffer);
    }

    /// Serialize the current parameter values
    pub fn state(&self) -> EngineResult<Vec<u8>> {
        self.params.capture_state().to_bytes()
    }

    /// Restore parameter values from a blob produced by [`state`](Self::state)
    ///
    /// The new values reach the filters at the next block.
    pub fn set_state(&mut self, bytes: &[u8]) -> EngineResult<()> {
        let state = PluginState::from_bytes(bytes)?;
        self.params.restore_state(&state);
        info!("Restored state ({} bytes)", bytes.len());
        Ok(())
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// IIR filters ring out, but the host is told there is no tail
    pub fn tail_length_seconds(&self) -> f64 {
        0.0
    }

    /// Settings the installed coefficients were designed from
    pub fn settings(&self) -> &ChainSettings {
        self.stereo.settings()
    }

    pub fn stereo(&self) -> &StereoProcessor {
        &self.stereo
    }

    pub fn coefficient_updates(&self) -> u64 {
        self.coefficient_updates
    }

    pub fn rejected_updates(&self) -> u64 {
        self.rejected_updates
    }

    /// Response of the installed chain at `frequency`, in dB
    pub fn magnitude_db_at(&self, frequency: f32) -> f64 {
        self.stereo.magnitude_db_at(frequency)
    }
}

impl AudioProcessor for EqProcessor {
    fn prepare(&mut self, context: ProcessContext) -> Result<(), DspError> {
        self.prepare_context(context)
    }

    fn process(&mut self, buffer: &mut [f32]) {
        self.process_interleaved(buffer);
    }

    fn reset(&mut self) {
        self.release_resources();
    }

    fn name(&self) -> &'static str {
        Self::NAME
    }
}
