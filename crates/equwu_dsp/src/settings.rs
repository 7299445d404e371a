//! Chain Settings
//!
//! The immutable snapshot of user-facing parameters that the coefficient
//! factory turns into filter coefficients. Taken once per block.

/// Number of second-order sections available to each cut filter
pub const MAX_CUT_SECTIONS: usize = 4;

/// Steepness of a cut filter in dB/octave
///
/// Each step adds one cascaded second-order Butterworth section (~12 dB/octave).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Slope {
    #[default]
    Db12,
    Db24,
    Db36,
    Db48,
}

impl Slope {
    /// All slopes, in choice-index order
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Number of cascaded second-order sections (1-4)
    pub fn order(self) -> usize {
        match self {
            Slope::Db12 => 1,
            Slope::Db24 => 2,
            Slope::Db36 => 3,
            Slope::Db48 => 4,
        }
    }

    pub fn db_per_octave(self) -> u32 {
        self.order() as u32 * 12
    }

    /// Position of this slope in the host's choice list
    pub fn index(self) -> usize {
        self.order() - 1
    }

    /// Slope for a choice index, `None` outside 0..=3
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Slope for a choice parameter stored as a float
    ///
    /// The parameter store keeps choices as whole numbers in 0..=3; anything
    /// else is rounded and clamped into range.
    pub fn from_choice(value: f32) -> Self {
        let index = value.round().clamp(0.0, 3.0) as usize;
        Self::ALL[index]
    }

    /// Label shown by hosts for the choice
    pub fn label(self) -> &'static str {
        match self {
            Slope::Db12 => "12 db/Oct",
            Slope::Db24 => "24 db/Oct",
            Slope::Db36 => "36 db/Oct",
            Slope::Db48 => "48 db/Oct",
        }
    }
}

/// Snapshot of every parameter that shapes the filter chain
///
/// Frequencies are expected in [20 Hz, sample_rate / 2) and quality > 0.
/// The parameter store clamps values before they reach this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainSettings {
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
    pub low_cut_bypassed: bool,
    pub peak_bypassed: bool,
    pub high_cut_bypassed: bool,
}

impl Default for ChainSettings {
    /// Neutral chain: cuts at the edges of the audible band, flat peak
    fn default() -> Self {
        Self {
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_freq: 20.0,
            high_cut_freq: 20000.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
            low_cut_bypassed: false,
            peak_bypassed: false,
            high_cut_bypassed: false,
        }
    }
}
