//! Cut-Filter Cascade
//!
//! A fixed bank of four second-order sections. A slope of N activates the
//! first N slots and bypasses the rest, so changing slope never resizes
//! anything on the audio thread.
//!
//! The same cascade type serves both low-cut and high-cut positions; the
//! direction lives entirely in the coefficients handed to [`CutFilter::update`].

use biquad::{Biquad, DirectForm2Transposed};

use crate::coefficients::{CoefficientSet, CutCoefficients};
use crate::settings::MAX_CUT_SECTIONS;

/// A single bypassable second-order section
///
/// Owns its filter history. Uses DirectForm2Transposed for better numerical
/// stability than DF1 when coefficients change between blocks.
pub struct Section {
    filter: DirectForm2Transposed<f32>,
    coefficients: CoefficientSet,
    bypassed: bool,
}

impl Section {
    /// Pass-through section with empty history
    pub fn new() -> Self {
        Self {
            filter: DirectForm2Transposed::<f32>::new(CoefficientSet::IDENTITY.to_biquad()),
            coefficients: CoefficientSet::IDENTITY,
            bypassed: false,
        }
    }

    /// Install new coefficients, keeping the filter history
    pub fn set_coefficients(&mut self, coefficients: CoefficientSet) {
        self.filter.update_coefficients(coefficients.to_biquad());
        self.coefficients = coefficients;
    }

    pub fn coefficients(&self) -> &CoefficientSet {
        &self.coefficients
    }

    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        if self.bypassed {
            input
        } else {
            self.filter.run(input)
        }
    }

    /// Clear the delay line
    pub fn reset(&mut self) {
        self.filter.reset_state();
    }

    /// Response in dB at `frequency`; 0 dB while bypassed
    pub fn magnitude_db_at(&self, frequency: f32, sample_rate: f32) -> f64 {
        if self.bypassed {
            0.0
        } else {
            self.coefficients.magnitude_db_at(frequency, sample_rate)
        }
    }
}

impl Default for Section {
    fn default() -> Self {
        Self::new()
    }
}

/// Four-slot cascade of second-order sections for one cut position
pub struct CutFilter {
    sections: [Section; MAX_CUT_SECTIONS],
    bypassed: bool,
}

impl CutFilter {
    /// Cascade with every slot passing audio through unmodified
    pub fn new() -> Self {
        Self {
            sections: core::array::from_fn(|_| {
                let mut section = Section::new();
                section.set_bypassed(true);
                section
            }),
            bypassed: false,
        }
    }

    /// Install a freshly designed set of sections
    ///
    /// Every slot is bypassed first; then slot `i` receives coefficient set
    /// `i` and is re-enabled, for each of the `coefficients.order()` sets.
    /// Slots past the order stay bypassed with stale coefficients. A slot is
    /// therefore never active while still holding coefficients from a
    /// previous design.
    pub fn update(&mut self, coefficients: &CutCoefficients) {
        self.install(coefficients.as_slice());
    }

    fn install(&mut self, coefficients: &[CoefficientSet]) {
        debug_assert!(
            (1..=MAX_CUT_SECTIONS).contains(&coefficients.len()),
            "cut filter needs 1-{} sections, got {}",
            MAX_CUT_SECTIONS,
            coefficients.len()
        );

        for section in self.sections.iter_mut() {
            section.set_bypassed(true);
        }

        for (section, coeffs) in self.sections.iter_mut().zip(coefficients) {
            section.set_coefficients(*coeffs);
            section.set_bypassed(false);
        }
    }

    /// Number of slots currently running audio
    pub fn active_sections(&self) -> usize {
        self.sections.iter().filter(|s| !s.is_bypassed()).count()
    }

    /// Whether slot `index` is bypassed
    ///
    /// # Panics
    /// Panics if `index >= MAX_CUT_SECTIONS`
    pub fn is_section_bypassed(&self, index: usize) -> bool {
        self.sections[index].is_bypassed()
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Bypass the whole position (all slots), independent of the slope
    pub fn set_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        if self.bypassed {
            return input;
        }
        self.sections
            .iter_mut()
            .fold(input, |sample, section| section.process_sample(sample))
    }

    /// Filter a mono block in-place
    pub fn process_block(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    pub fn reset(&mut self) {
        for section in self.sections.iter_mut() {
            section.reset();
        }
    }

    /// Combined response of the active slots in dB
    pub fn magnitude_db_at(&self, frequency: f32, sample_rate: f32) -> f64 {
        if self.bypassed {
            return 0.0;
        }
        self.sections
            .iter()
            .map(|s| s.magnitude_db_at(frequency, sample_rate))
            .sum()
    }
}

impl Default for CutFilter {
    fn default() -> Self {
        Self::new()
    }
}
