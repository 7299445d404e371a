//! Mono Signal Chain
//!
//! Low-cut cascade -> peak section -> high-cut cascade, for one channel.

use crate::cascade::{CutFilter, Section};
use crate::coefficients::{CoefficientSet, CutCoefficients};

/// Position of a stage inside a [`MonoChain`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

/// Coefficients for every stage of a chain, designed from one settings snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainCoefficients {
    pub low_cut: CutCoefficients,
    pub peak: CoefficientSet,
    pub high_cut: CutCoefficients,
}

/// Filter chain for a single channel
///
/// Holds the channel's filter history. Two chains may share coefficients but
/// never history.
pub struct MonoChain {
    low_cut: CutFilter,
    peak: Section,
    high_cut: CutFilter,
}

impl MonoChain {
    pub fn new() -> Self {
        Self {
            low_cut: CutFilter::new(),
            peak: Section::new(),
            high_cut: CutFilter::new(),
        }
    }

    /// Install coefficients for all three positions
    pub fn apply(&mut self, coefficients: &ChainCoefficients) {
        self.low_cut.update(&coefficients.low_cut);
        self.peak.set_coefficients(coefficients.peak);
        self.high_cut.update(&coefficients.high_cut);
    }

    /// Bypass a whole position
    pub fn set_bypassed(&mut self, position: ChainPosition, bypassed: bool) {
        match position {
            ChainPosition::LowCut => self.low_cut.set_bypassed(bypassed),
            ChainPosition::Peak => self.peak.set_bypassed(bypassed),
            ChainPosition::HighCut => self.high_cut.set_bypassed(bypassed),
        }
    }

    pub fn is_bypassed(&self, position: ChainPosition) -> bool {
        match position {
            ChainPosition::LowCut => self.low_cut.is_bypassed(),
            ChainPosition::Peak => self.peak.is_bypassed(),
            ChainPosition::HighCut => self.high_cut.is_bypassed(),
        }
    }

    pub fn low_cut(&self) -> &CutFilter {
        &self.low_cut
    }

    pub fn peak(&self) -> &Section {
        &self.peak
    }

    pub fn high_cut(&self) -> &CutFilter {
        &self.high_cut
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let sample = self.low_cut.process_sample(input);
        let sample = self.peak.process_sample(sample);
        self.high_cut.process_sample(sample)
    }

    /// Filter a mono block in-place
    pub fn process_block(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear the history of every section
    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }

    /// Overall response in dB at `frequency`
    ///
    /// Sums the active sections of all three positions; this is the curve a
    /// response display draws.
    pub fn magnitude_db_at(&self, frequency: f32, sample_rate: f32) -> f64 {
        self.low_cut.magnitude_db_at(frequency, sample_rate)
            + self.peak.magnitude_db_at(frequency, sample_rate)
            + self.high_cut.magnitude_db_at(frequency, sample_rate)
    }
}

impl Default for MonoChain {
    fn default() -> Self {
        Self::new()
    }
}
