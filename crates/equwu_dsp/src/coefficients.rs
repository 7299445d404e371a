//! Coefficient Factory
//!
//! Pure functions turning [`ChainSettings`] into second-order section
//! coefficients. Based on the RBJ (Robert Bristow-Johnson) Audio EQ Cookbook
//! designs exposed by the `biquad` crate:
//! - the peak band is a single peaking (bell) section
//! - each cut filter is a Butterworth low-pass/high-pass of order `2 * N`,
//!   realised as `N` cascaded second-order sections with staggered Q
//!
//! # Input assumptions
//!
//! Frequencies at or above Nyquist are pulled just below it with
//! [`limit_to_nyquist`], so a 20 kHz cut stays designable at 32 kHz. The
//! parameter store keeps quality positive; a non-positive frequency or a
//! negative quality that slipped through would yield NaN/Inf coefficients,
//! so those rejections surface as [`DspError::InvalidCoefficients`].

use core::f64::consts::PI;

use biquad::{Coefficients, Hertz, Type};

use crate::chain::ChainCoefficients;
use crate::error::DspError;
use crate::settings::{ChainSettings, Slope, MAX_CUT_SECTIONS};

/// Coefficients of one normalized second-order section (a0 = 1)
///
/// Transfer function: `H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSet {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl CoefficientSet {
    /// Pass-through section
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    pub fn to_biquad(self) -> Coefficients<f32> {
        Coefficients {
            a1: self.a1,
            a2: self.a2,
            b0: self.b0,
            b1: self.b1,
            b2: self.b2,
        }
    }

    /// Linear magnitude of the section's response at `frequency`
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f64 {
        let w = 2.0 * PI * frequency as f64 / sample_rate as f64;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let (b0, b1, b2) = (self.b0 as f64, self.b1 as f64, self.b2 as f64);
        let (a1, a2) = (self.a1 as f64, self.a2 as f64);

        // Evaluate numerator and denominator at z = e^(jw)
        let num_re = b0 + b1 * cos1 + b2 * cos2;
        let num_im = -(b1 * sin1 + b2 * sin2);
        let den_re = 1.0 + a1 * cos1 + a2 * cos2;
        let den_im = -(a1 * sin1 + a2 * sin2);

        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }

    /// Magnitude in dB at `frequency`
    pub fn magnitude_db_at(&self, frequency: f32, sample_rate: f32) -> f64 {
        20.0 * self.magnitude_at(frequency, sample_rate).log10()
    }
}

impl Default for CoefficientSet {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Coefficients<f32>> for CoefficientSet {
    fn from(c: Coefficients<f32>) -> Self {
        Self {
            b0: c.b0,
            b1: c.b1,
            b2: c.b2,
            a1: c.a1,
            a2: c.a2,
        }
    }
}

/// Which side of the spectrum a cut filter removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutDirection {
    /// High-pass: removes content below the cutoff
    LowCut,
    /// Low-pass: removes content above the cutoff
    HighCut,
}

/// Ordered coefficient sections for one cut filter
///
/// Fixed capacity so that rebuilding on the audio thread never allocates.
/// Only the first `order` entries are meaningful.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutCoefficients {
    sections: [CoefficientSet; MAX_CUT_SECTIONS],
    order: usize,
}

impl CutCoefficients {
    /// Number of active sections (1-4)
    pub fn order(&self) -> usize {
        self.order
    }

    /// Active sections, in cascade order
    pub fn as_slice(&self) -> &[CoefficientSet] {
        &self.sections[..self.order]
    }
}

/// Q of each conjugate pole pair in a Butterworth filter of `filter_order`
///
/// Pole pair `k` sits at angle `(2k + 1) * PI / (2 * filter_order)` from the
/// real axis, giving `Q_k = 1 / (2 cos(theta_k))`. Sections are returned in
/// ascending-Q order.
pub fn butterworth_q(filter_order: usize, section: usize) -> f32 {
    let theta = (2 * section + 1) as f64 * PI / (2 * filter_order) as f64;
    (1.0 / (2.0 * theta.cos())) as f32
}

/// Highest design frequency as a fraction of the sample rate
pub const MAX_FREQUENCY_RATIO: f32 = 0.4995;

/// Pull `frequency` just below Nyquist for `sample_rate`
pub fn limit_to_nyquist(frequency: f32, sample_rate: f32) -> f32 {
    frequency.min(sample_rate * MAX_FREQUENCY_RATIO)
}

fn hertz(value: f32, frequency: f32, sample_rate: f32) -> Result<Hertz<f32>, DspError> {
    Hertz::<f32>::from_hz(value).map_err(|_| DspError::InvalidCoefficients {
        frequency,
        sample_rate,
    })
}

/// Design the peak (bell) section
///
/// Boost/cut of `peak_gain_db` at `peak_freq`, bandwidth set by `peak_quality`.
/// The `biquad` design takes the gain in dB directly; it is equivalent to a
/// linear gain of `10^(dB/20)` as used by the cookbook's `A = sqrt(gain)`.
pub fn make_peak_coefficients(
    settings: &ChainSettings,
    sample_rate: f32,
) -> Result<CoefficientSet, DspError> {
    let freq = limit_to_nyquist(settings.peak_freq, sample_rate);
    let fs = hertz(sample_rate, freq, sample_rate)?;
    let f0 = hertz(freq, freq, sample_rate)?;

    Coefficients::<f32>::from_params(
        Type::PeakingEQ(settings.peak_gain_db),
        fs,
        f0,
        settings.peak_quality,
    )
    .map(CoefficientSet::from)
    .map_err(|_| DspError::InvalidCoefficients {
        frequency: freq,
        sample_rate,
    })
}

/// Design a Butterworth cut filter as `slope.order()` cascaded sections
///
/// Section `i` uses [`butterworth_q`] for pole pair `i`, so the output order is
/// fixed for given inputs.
pub fn make_cut_coefficients(
    direction: CutDirection,
    cutoff: f32,
    sample_rate: f32,
    slope: Slope,
) -> Result<CutCoefficients, DspError> {
    let cutoff = limit_to_nyquist(cutoff, sample_rate);
    let order = slope.order();
    let filter_order = order * 2;

    let mut sections = [CoefficientSet::IDENTITY; MAX_CUT_SECTIONS];
    for (i, section) in sections.iter_mut().enumerate().take(order) {
        let filter_type = match direction {
            CutDirection::LowCut => Type::HighPass,
            CutDirection::HighCut => Type::LowPass,
        };
        let coeffs = Coefficients::<f32>::from_params(
            filter_type,
            hertz(sample_rate, cutoff, sample_rate)?,
            hertz(cutoff, cutoff, sample_rate)?,
            butterworth_q(filter_order, i),
        )
        .map_err(|_| DspError::InvalidCoefficients {
            frequency: cutoff,
            sample_rate,
        })?;
        *section = coeffs.into();
    }

    Ok(CutCoefficients { sections, order })
}

/// Low-cut (high-pass) sections for the settings' cutoff and slope
pub fn make_low_cut_coefficients(
    settings: &ChainSettings,
    sample_rate: f32,
) -> Result<CutCoefficients, DspError> {
    make_cut_coefficients(
        CutDirection::LowCut,
        settings.low_cut_freq,
        sample_rate,
        settings.low_cut_slope,
    )
}

/// High-cut (low-pass) sections for the settings' cutoff and slope
pub fn make_high_cut_coefficients(
    settings: &ChainSettings,
    sample_rate: f32,
) -> Result<CutCoefficients, DspError> {
    make_cut_coefficients(
        CutDirection::HighCut,
        settings.high_cut_freq,
        sample_rate,
        settings.high_cut_slope,
    )
}

/// Design every position of the chain from one settings snapshot
///
/// All three designs complete before anything is returned, so a rejected
/// design leaves the caller free to keep its previous coefficients.
pub fn make_chain_coefficients(
    settings: &ChainSettings,
    sample_rate: f32,
) -> Result<ChainCoefficients, DspError> {
    Ok(ChainCoefficients {
        low_cut: make_low_cut_coefficients(settings, sample_rate)?,
        peak: make_peak_coefficients(settings, sample_rate)?,
        high_cut: make_high_cut_coefficients(settings, sample_rate)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f32 = 48000.0;

    fn cascade_db(coeffs: &CutCoefficients, freq: f32) -> f64 {
        coeffs
            .as_slice()
            .iter()
            .map(|c| c.magnitude_db_at(freq, FS))
            .sum()
    }

    #[test]
    fn test_butterworth_q_values() {
        // 2nd order: single section at 1/sqrt(2)
        assert!((butterworth_q(2, 0) - core::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);

        // 4th order: 0.5412, 1.3066
        assert!((butterworth_q(4, 0) - 0.541_196).abs() < 1e-5);
        assert!((butterworth_q(4, 1) - 1.306_563).abs() < 1e-5);

        // 8th order: ascending Q
        let qs: Vec<f32> = (0..4).map(|i| butterworth_q(8, i)).collect();
        assert!(qs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_peak_coefficients_deterministic() {
        let settings = ChainSettings {
            peak_freq: 1234.0,
            peak_gain_db: 7.5,
            peak_quality: 2.3,
            ..Default::default()
        };

        let a = make_peak_coefficients(&settings, FS).unwrap();
        let b = make_peak_coefficients(&settings, FS).unwrap();
        assert_eq!(a.b0.to_bits(), b.b0.to_bits());
        assert_eq!(a.b1.to_bits(), b.b1.to_bits());
        assert_eq!(a.b2.to_bits(), b.b2.to_bits());
        assert_eq!(a.a1.to_bits(), b.a1.to_bits());
        assert_eq!(a.a2.to_bits(), b.a2.to_bits());
    }

    #[test]
    fn test_cut_coefficients_deterministic() {
        for slope in Slope::ALL {
            let a = make_cut_coefficients(CutDirection::LowCut, 180.0, FS, slope).unwrap();
            let b = make_cut_coefficients(CutDirection::LowCut, 180.0, FS, slope).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_cut_length_matches_slope() {
        for slope in Slope::ALL {
            let coeffs = make_cut_coefficients(CutDirection::HighCut, 5000.0, FS, slope).unwrap();
            assert_eq!(coeffs.order(), slope.order());
            assert_eq!(coeffs.as_slice().len(), slope.order());
        }
    }

    #[test]
    fn test_flat_peak_is_identity_response() {
        let settings = ChainSettings::default();
        let coeffs = make_peak_coefficients(&settings, FS).unwrap();

        for freq in [20.0, 100.0, 750.0, 5000.0, 18000.0] {
            let db = coeffs.magnitude_db_at(freq, FS);
            assert!(db.abs() < 1e-3, "0 dB peak should be flat, got {db} dB at {freq} Hz");
        }
    }

    #[test]
    fn test_peak_gain_at_center() {
        for gain in [-24.0_f32, -6.0, 6.0, 24.0] {
            let settings = ChainSettings {
                peak_freq: 1000.0,
                peak_gain_db: gain,
                peak_quality: 1.0,
                ..Default::default()
            };
            let coeffs = make_peak_coefficients(&settings, FS).unwrap();
            let db = coeffs.magnitude_db_at(1000.0, FS);
            assert!((db - gain as f64).abs() < 0.05, "expected {gain} dB, got {db}");
        }
    }

    #[test]
    fn test_cutoff_is_minus_3db() {
        for slope in Slope::ALL {
            let low = make_cut_coefficients(CutDirection::LowCut, 1000.0, FS, slope).unwrap();
            let high = make_cut_coefficients(CutDirection::HighCut, 1000.0, FS, slope).unwrap();
            assert!((cascade_db(&low, 1000.0) + 3.01).abs() < 0.1);
            assert!((cascade_db(&high, 1000.0) + 3.01).abs() < 0.1);
        }
    }

    #[test]
    fn test_slope_scaling_one_octave_out() {
        let mut previous_high = 0.0;
        let mut previous_low = 0.0;

        for slope in Slope::ALL {
            let high = make_cut_coefficients(CutDirection::HighCut, 1000.0, FS, slope).unwrap();
            let low = make_cut_coefficients(CutDirection::LowCut, 1000.0, FS, slope).unwrap();

            let high_att = -cascade_db(&high, 2000.0);
            let low_att = -cascade_db(&low, 500.0);

            assert!(high_att > previous_high);
            assert!(low_att > previous_low);

            let expected = slope.db_per_octave() as f64;
            assert!((high_att - expected).abs() < 1.0, "{slope:?}: high-cut {high_att} dB");
            assert!((low_att - expected).abs() < 1.0, "{slope:?}: low-cut {low_att} dB");

            if slope != Slope::Db12 {
                assert!((high_att - previous_high - 12.0).abs() < 1.0);
                assert!((low_att - previous_low - 12.0).abs() < 1.0);
            }

            previous_high = high_att;
            previous_low = low_att;
        }
    }

    #[test]
    fn test_passband_is_flat() {
        let low = make_cut_coefficients(CutDirection::LowCut, 50.0, FS, Slope::Db48).unwrap();
        let high = make_cut_coefficients(CutDirection::HighCut, 15000.0, FS, Slope::Db48).unwrap();
        assert!(cascade_db(&low, 1000.0).abs() < 0.01);
        assert!(cascade_db(&high, 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_cutoff_above_nyquist_is_limited() {
        let fs = 32000.0;
        let high = make_cut_coefficients(CutDirection::HighCut, 20000.0, fs, Slope::Db24).unwrap();
        let at_limit =
            make_cut_coefficients(CutDirection::HighCut, fs * MAX_FREQUENCY_RATIO, fs, Slope::Db24)
                .unwrap();
        assert_eq!(high, at_limit);

        // Practically transparent through the audible band
        let db: f64 = high.as_slice().iter().map(|c| c.magnitude_db_at(1000.0, fs)).sum();
        assert!(db.abs() < 0.01, "{db}");
    }

    #[test]
    fn test_peak_above_nyquist_is_limited() {
        let settings = ChainSettings {
            peak_freq: 20000.0,
            peak_gain_db: 6.0,
            ..Default::default()
        };
        let peak = make_peak_coefficients(&settings, 22050.0).unwrap();
        assert!(peak.magnitude_db_at(1000.0, 22050.0).is_finite());
    }

    #[test]
    fn test_limit_to_nyquist() {
        assert_eq!(limit_to_nyquist(1000.0, FS), 1000.0);
        assert_eq!(limit_to_nyquist(30000.0, FS), FS * MAX_FREQUENCY_RATIO);
        assert!(limit_to_nyquist(20000.0, 32000.0) < 16000.0);
    }

    #[test]
    fn test_negative_quality_rejected() {
        let settings = ChainSettings {
            peak_quality: -1.0,
            ..Default::default()
        };
        let result = make_peak_coefficients(&settings, FS);
        assert!(matches!(result, Err(DspError::InvalidCoefficients { .. })));
    }

    #[test]
    fn test_chain_coefficients_match_individual_designs() {
        let settings = ChainSettings {
            low_cut_slope: Slope::Db36,
            high_cut_freq: 9000.0,
            peak_gain_db: 3.0,
            ..Default::default()
        };
        let chain = make_chain_coefficients(&settings, FS).unwrap();
        assert_eq!(chain.low_cut, make_low_cut_coefficients(&settings, FS).unwrap());
        assert_eq!(chain.peak, make_peak_coefficients(&settings, FS).unwrap());
        assert_eq!(chain.high_cut, make_high_cut_coefficients(&settings, FS).unwrap());
    }

    #[test]
    fn test_identity_response() {
        let id = CoefficientSet::IDENTITY;
        assert!((id.magnitude_at(1000.0, FS) - 1.0).abs() < 1e-12);
        assert_eq!(CoefficientSet::default(), id);
    }
}
