//! Stereo Processor
//!
//! Two [`MonoChain`]s driven with identical coefficients. The left channel
//! only ever passes through the left chain and the right through the right,
//! so each channel keeps its own filter history.
//!
//! # Real-time Safety
//!
//! Nothing after `prepare()` allocates. Coefficients are designed into
//! fixed-size values on the calling (audio) thread and copied into both
//! chains before the block is filtered.

use crate::chain::{ChainCoefficients, ChainPosition, MonoChain};
use crate::coefficients::make_chain_coefficients;
use crate::error::DspError;
use crate::processor::{AudioProcessor, ProcessContext};
use crate::settings::ChainSettings;

/// Channel count the processor accepts
pub const CHANNELS: usize = 2;

pub struct StereoProcessor {
    left: MonoChain,
    right: MonoChain,
    context: Option<ProcessContext>,
    settings: ChainSettings,
}

impl StereoProcessor {
    /// Unprepared processor; call [`prepare`](Self::prepare) before processing
    pub fn new() -> Self {
        Self {
            left: MonoChain::new(),
            right: MonoChain::new(),
            context: None,
            settings: ChainSettings::default(),
        }
    }

    /// Prepare for a stream
    ///
    /// Clears all filter history and redesigns the coefficients of the last
    /// applied settings for the new sample rate. On error nothing changes:
    /// the previous context (or unprepared state), history and coefficients
    /// stay as they were.
    ///
    /// # Panics
    /// Panics if `context.channels` is not 2
    pub fn prepare(&mut self, context: ProcessContext) -> Result<(), DspError> {
        assert_eq!(
            context.channels, CHANNELS,
            "stereo processor requires {} channels, got {}",
            CHANNELS, context.channels
        );
        context.validate()?;
        let coefficients = make_chain_coefficients(&self.settings, context.sample_rate)?;

        self.context = Some(context);
        self.reset();

        let settings = self.settings;
        self.install(&coefficients, &settings);
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.context.is_some()
    }

    fn context(&self) -> ProcessContext {
        match self.context {
            Some(context) => context,
            None => panic!("stereo processor used before prepare()"),
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.context().sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.context().max_block_size
    }

    /// Settings the current coefficients were designed from
    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Redesign coefficients and install them in both chains
    ///
    /// On error neither chain is touched and the previous coefficients stay
    /// in effect.
    ///
    /// # Panics
    /// Panics if called before `prepare()`
    pub fn update(&mut self, settings: &ChainSettings) -> Result<(), DspError> {
        let coefficients = make_chain_coefficients(settings, self.sample_rate())?;
        self.install(&coefficients, settings);
        Ok(())
    }

    fn install(&mut self, coefficients: &ChainCoefficients, settings: &ChainSettings) {
        for chain in [&mut self.left, &mut self.right] {
            chain.apply(coefficients);
            chain.set_bypassed(ChainPosition::LowCut, settings.low_cut_bypassed);
            chain.set_bypassed(ChainPosition::Peak, settings.peak_bypassed);
            chain.set_bypassed(ChainPosition::HighCut, settings.high_cut_bypassed);
        }
        self.settings = *settings;
    }

    /// Process separate left/right channel buffers in-place
    ///
    /// # Panics
    /// Panics if unprepared, if the channels differ in length, or if the
    /// block exceeds the prepared maximum
    #[inline]
    pub fn process_planar(&mut self, left: &mut [f32], right: &mut [f32]) {
        assert_eq!(left.len(), right.len(), "Channel buffers must be same length");
        self.check_block(left.len());

        self.left.process_block(left);
        self.right.process_block(right);
    }

    /// Process an interleaved stereo buffer in-place
    ///
    /// Buffer format: [L0, R0, L1, R1, L2, R2, ...]
    ///
    /// # Panics
    /// Panics if unprepared, if the buffer holds a partial frame, or if the
    /// block exceeds the prepared maximum
    #[inline]
    pub fn process_interleaved(&mut self, buffer: &mut [f32]) {
        assert_eq!(buffer.len() % CHANNELS, 0, "Interleaved buffer holds a partial frame");
        self.check_block(buffer.len() / CHANNELS);

        for frame in buffer.chunks_exact_mut(CHANNELS) {
            frame[0] = self.left.process_sample(frame[0]);
            frame[1] = self.right.process_sample(frame[1]);
        }
    }

    /// Process a host-style list of channel buffers
    ///
    /// # Panics
    /// Panics unless exactly two channels are given, plus the conditions of
    /// [`process_planar`](Self::process_planar)
    pub fn process_channels(&mut self, channels: &mut [&mut [f32]]) {
        match channels {
            [left, right] => self.process_planar(left, right),
            _ => panic!(
                "stereo processor requires {} channels, got {}",
                CHANNELS,
                channels.len()
            ),
        }
    }

    fn check_block(&self, frames: usize) {
        let max = self.max_block_size();
        assert!(
            frames <= max,
            "block of {} frames exceeds prepared maximum of {}",
            frames,
            max
        );
    }

    /// Clear the filter history of both channels
    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }

    pub fn left(&self) -> &MonoChain {
        &self.left
    }

    pub fn right(&self) -> &MonoChain {
        &self.right
    }

    /// Overall response in dB at `frequency`
    ///
    /// Both channels share coefficients, so the left chain speaks for both.
    pub fn magnitude_db_at(&self, frequency: f32) -> f64 {
        self.left.magnitude_db_at(frequency, self.sample_rate())
    }
}

impl Default for StereoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioProcessor for StereoProcessor {
    fn prepare(&mut self, context: ProcessContext) -> Result<(), DspError> {
        StereoProcessor::prepare(self, context)
    }

    fn process(&mut self, buffer: &mut [f32]) {
        self.process_interleaved(buffer);
    }

    fn reset(&mut self) {
        StereoProcessor::reset(self);
    }

    fn name(&self) -> &'static str {
        "Stereo Filter Chain"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Slope;

    const FS: f32 = 48000.0;

    fn prepared(max_block: usize) -> StereoProcessor {
        let mut processor = StereoProcessor::new();
        processor.prepare(ProcessContext::stereo(FS, max_block)).unwrap();
        processor
    }

    fn noise(seed: u32, len: usize) -> Vec<f32> {
        // xorshift; deterministic and uncorrelated across seeds
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect()
    }

    fn steep_settings() -> ChainSettings {
        ChainSettings {
            low_cut_freq: 200.0,
            low_cut_slope: Slope::Db48,
            peak_freq: 1500.0,
            peak_gain_db: 12.0,
            peak_quality: 4.0,
            high_cut_freq: 4000.0,
            high_cut_slope: Slope::Db36,
            ..Default::default()
        }
    }

    #[test]
    fn test_prepare_sets_context() {
        let processor = prepared(256);
        assert!(processor.is_prepared());
        assert_eq!(processor.sample_rate(), FS);
        assert_eq!(processor.max_block_size(), 256);
    }

    #[test]
    fn test_prepare_rejects_bad_sample_rate() {
        let mut processor = StereoProcessor::new();
        let result = processor.prepare(ProcessContext::stereo(-1.0, 256));
        assert_eq!(result, Err(DspError::InvalidSampleRate(-1.0)));
        assert!(!processor.is_prepared());
    }

    #[test]
    #[should_panic(expected = "requires 2 channels")]
    fn test_prepare_rejects_mono() {
        let mut processor = StereoProcessor::new();
        let _ = processor.prepare(ProcessContext::new(FS, 1, 256));
    }

    #[test]
    #[should_panic(expected = "before prepare")]
    fn test_process_before_prepare_panics() {
        let mut processor = StereoProcessor::new();
        let mut buffer = [0.0; 4];
        processor.process_interleaved(&mut buffer);
    }

    #[test]
    #[should_panic(expected = "exceeds prepared maximum")]
    fn test_oversized_block_panics() {
        let mut processor = prepared(4);
        let mut left = [0.0; 8];
        let mut right = [0.0; 8];
        processor.process_planar(&mut left, &mut right);
    }

    #[test]
    #[should_panic(expected = "requires 2 channels")]
    fn test_three_channels_panics() {
        let mut processor = prepared(16);
        let mut a = [0.0; 4];
        let mut b = [0.0; 4];
        let mut c = [0.0; 4];
        processor.process_channels(&mut [&mut a[..], &mut b[..], &mut c[..]]);
    }

    #[test]
    fn test_update_sets_identical_coefficients() {
        let mut processor = prepared(512);
        processor.update(&steep_settings()).unwrap();

        let (left, right) = (processor.left(), processor.right());
        assert_eq!(left.peak().coefficients(), right.peak().coefficients());
        for i in 0..4 {
            let l = left.low_cut().section(i).unwrap();
            let r = right.low_cut().section(i).unwrap();
            assert_eq!(l.coefficients(), r.coefficients());
            assert_eq!(l.is_bypassed(), r.is_bypassed());

            let l = left.high_cut().section(i).unwrap();
            let r = right.high_cut().section(i).unwrap();
            assert_eq!(l.coefficients(), r.coefficients());
            assert_eq!(l.is_bypassed(), r.is_bypassed());
        }
        assert_eq!(left.low_cut().active_sections(), 4);
        assert_eq!(left.high_cut().active_sections(), 3);
    }

    #[test]
    fn test_failed_update_keeps_previous_coefficients() {
        let mut processor = prepared(512);
        processor.update(&steep_settings()).unwrap();
        let before = *processor.left().peak().coefficients();

        let invalid = ChainSettings {
            peak_quality: -1.0,
            peak_gain_db: -3.0,
            ..steep_settings()
        };
        assert!(processor.update(&invalid).is_err());
        assert_eq!(*processor.left().peak().coefficients(), before);
        assert_eq!(processor.settings(), &steep_settings());
    }

    #[test]
    fn test_channel_independence() {
        let mut processor = prepared(1024);
        processor.update(&steep_settings()).unwrap();

        let mut left = noise(1, 1024);
        let mut right = noise(2, 1024);
        let (left_in, right_in) = (left.clone(), right.clone());
        processor.process_planar(&mut left, &mut right);

        // Each output must equal that channel's input run through a fresh,
        // isolated chain with the same coefficients.
        let mut reference = prepared(1024);
        reference.update(&steep_settings()).unwrap();
        let mut left_ref = left_in;
        let mut silent = vec![0.0; 1024];
        reference.process_planar(&mut left_ref, &mut silent);
        assert_eq!(left, left_ref);
        assert!(silent.iter().all(|&s| s == 0.0));

        reference.reset();
        let mut right_ref = right_in;
        let mut silent = vec![0.0; 1024];
        reference.process_planar(&mut silent, &mut right_ref);
        assert_eq!(right, right_ref);

        assert_ne!(left, right);
    }

    #[test]
    fn test_interleaved_matches_planar() {
        let mut planar = prepared(256);
        let mut interleaved = prepared(256);
        planar.update(&steep_settings()).unwrap();
        interleaved.update(&steep_settings()).unwrap();

        let mut left = noise(7, 256);
        let mut right = noise(11, 256);
        let mut buffer: Vec<f32> = left
            .iter()
            .zip(right.iter())
            .flat_map(|(&l, &r)| [l, r])
            .collect();

        planar.process_planar(&mut left, &mut right);
        interleaved.process_interleaved(&mut buffer);

        for (i, frame) in buffer.chunks_exact(2).enumerate() {
            assert_eq!(frame[0], left[i]);
            assert_eq!(frame[1], right[i]);
        }
    }

    #[test]
    fn test_prepare_twice_resets_to_silence() {
        let mut processor = prepared(512);
        processor.update(&steep_settings()).unwrap();

        for _ in 0..2 {
            let mut left = noise(3, 512);
            let mut right = noise(5, 512);
            processor.process_planar(&mut left, &mut right);

            processor.prepare(ProcessContext::stereo(FS, 512)).unwrap();

            let mut left = vec![0.0; 512];
            let mut right = vec![0.0; 512];
            processor.process_planar(&mut left, &mut right);
            assert!(left.iter().chain(right.iter()).all(|&s| s == 0.0));
        }
    }

    #[test]
    fn test_prepare_redesigns_for_new_sample_rate() {
        let mut processor = prepared(512);
        processor.update(&steep_settings()).unwrap();
        let at_48k = *processor.left().peak().coefficients();

        processor.prepare(ProcessContext::stereo(96000.0, 512)).unwrap();
        assert_ne!(*processor.left().peak().coefficients(), at_48k);
        assert_eq!(processor.settings(), &steep_settings());

        // Peak still lands on its center frequency at the new rate
        assert!((processor.magnitude_db_at(1500.0) - 12.0).abs() < 0.5);
    }

    #[test]
    fn test_prepare_at_low_rate_keeps_designing() {
        let mut processor = prepared(512);
        let settings = ChainSettings {
            peak_freq: 1000.0,
            peak_gain_db: 12.0,
            ..Default::default()
        };
        processor.update(&settings).unwrap();

        // 20 kHz high cut sits above Nyquist at 32 kHz
        processor.prepare(ProcessContext::stereo(32000.0, 512)).unwrap();
        assert!((processor.magnitude_db_at(1000.0) - 12.0).abs() < 0.1);
        assert!(processor.magnitude_db_at(666.7) < 11.0);

        let cut = ChainSettings {
            peak_gain_db: -12.0,
            ..settings
        };
        processor.update(&cut).unwrap();
        assert_eq!(processor.settings().peak_gain_db, -12.0);
        assert!((processor.magnitude_db_at(1000.0) + 12.0).abs() < 0.1);
    }

    #[test]
    fn test_failed_prepare_changes_nothing() {
        let mut processor = prepared(256);
        processor.update(&steep_settings()).unwrap();
        let peak = *processor.left().peak().coefficients();

        let result = processor.prepare(ProcessContext::stereo(f32::NAN, 1024));
        assert!(matches!(result, Err(DspError::InvalidSampleRate(_))));
        let result = processor.prepare(ProcessContext::stereo(32000.0, 0));
        assert!(matches!(result, Err(DspError::InvalidBlockSize)));

        assert!(processor.is_prepared());
        assert_eq!(processor.sample_rate(), FS);
        assert_eq!(processor.max_block_size(), 256);
        assert_eq!(*processor.left().peak().coefficients(), peak);
    }

    #[test]
    fn test_bypass_flags_reach_both_chains() {
        let mut processor = prepared(64);
        let settings = ChainSettings {
            low_cut_bypassed: true,
            high_cut_bypassed: true,
            ..steep_settings()
        };
        processor.update(&settings).unwrap();

        for chain in [processor.left(), processor.right()] {
            assert!(chain.is_bypassed(ChainPosition::LowCut));
            assert!(!chain.is_bypassed(ChainPosition::Peak));
            assert!(chain.is_bypassed(ChainPosition::HighCut));
        }
    }

    #[test]
    fn test_trait_object_usage() {
        let mut processor: Box<dyn AudioProcessor> = Box::new(StereoProcessor::new());
        processor.prepare(ProcessContext::stereo(FS, 4)).unwrap();

        let mut buffer = [0.5, -0.5, 0.3, -0.3];
        processor.process(&mut buffer);
        assert!(buffer.iter().all(|s| s.is_finite()));
        assert_eq!(processor.name(), "Stereo Filter Chain");
    }
}
