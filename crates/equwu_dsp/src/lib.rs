//! EQUwU DSP - Digital Signal Processing Module
//!
//! This crate provides the real-time filter chain for EQUwU:
//! - Coefficient factory: Butterworth cut filters and an RBJ peak band
//! - Fixed four-slot cut cascades (12/24/36/48 dB/octave)
//! - Mono chain: low-cut -> peak -> high-cut
//! - Stereo processor with independent per-channel filter history
//! - Zero-allocation processing path
//!
//! # Architecture
//!
//! The DSP chain follows a strict "no allocation in audio callback" rule.
//! Settings are snapshotted at the start of each block, turned into
//! fixed-size coefficient values on the audio thread, and installed into
//! both channels before the block is filtered.

mod cascade;
mod chain;
mod coefficients;
mod error;
mod processor;
mod settings;
mod stereo;

pub use cascade::{CutFilter, Section};
pub use chain::{ChainCoefficients, ChainPosition, MonoChain};
pub use coefficients::{
    butterworth_q, limit_to_nyquist, make_chain_coefficients, make_cut_coefficients,
    make_high_cut_coefficients, make_low_cut_coefficients, make_peak_coefficients,
    CoefficientSet, CutCoefficients, CutDirection, MAX_FREQUENCY_RATIO,
};
pub use error::DspError;
pub use processor::{AudioProcessor, ProcessContext};
pub use settings::{ChainSettings, Slope, MAX_CUT_SECTIONS};
pub use stereo::{StereoProcessor, CHANNELS};
