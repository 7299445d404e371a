//! Parameter Store
//!
//! The host-facing parameters of the equalizer, stored lock-free so the UI
//! thread can write them at any time while the audio thread reads them.
//!
//! # Threading
//!
//! Every value lives in its own `AtomicU32` (f32 bits); there is no `AtomicF32`.
//! A generation counter is bumped with `Release` after each write. The audio
//! thread loads the generation with `Acquire` before taking a
//! [`chain_settings`](ParameterStore::chain_settings) snapshot, so a changed
//! generation guarantees the new values are visible. A write racing with a
//! snapshot is picked up no later than the next block.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use equwu_dsp::{ChainSettings, Slope};
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::state::PluginState;

/// Number of parameters exposed to the host
pub const PARAM_COUNT: usize = 10;

/// Every parameter of the equalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
    LowCutBypassed,
    PeakBypassed,
    HighCutBypassed,
}

impl ParameterId {
    pub const ALL: [ParameterId; PARAM_COUNT] = [
        ParameterId::LowCutFreq,
        ParameterId::HighCutFreq,
        ParameterId::PeakFreq,
        ParameterId::PeakGain,
        ParameterId::PeakQuality,
        ParameterId::LowCutSlope,
        ParameterId::HighCutSlope,
        ParameterId::LowCutBypassed,
        ParameterId::PeakBypassed,
        ParameterId::HighCutBypassed,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Stable identifier used by hosts and in saved state
    pub fn id(self) -> &'static str {
        match self {
            ParameterId::LowCutFreq => "LowCut Freq",
            ParameterId::HighCutFreq => "HighCut Freq",
            ParameterId::PeakFreq => "Peak Freq",
            ParameterId::PeakGain => "Peak Gain",
            ParameterId::PeakQuality => "Peak Quality",
            ParameterId::LowCutSlope => "LowCut Slope",
            ParameterId::HighCutSlope => "HighCut Slope",
            ParameterId::LowCutBypassed => "LowCut Bypassed",
            ParameterId::PeakBypassed => "Peak Bypassed",
            ParameterId::HighCutBypassed => "HighCut Bypassed",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.id() == id)
    }

    /// Range, step and default of the parameter
    pub fn range(self) -> ParamRange {
        match self {
            ParameterId::LowCutFreq => ParamRange::frequency(20.0),
            ParameterId::HighCutFreq => ParamRange::frequency(20000.0),
            ParameterId::PeakFreq => ParamRange::frequency(750.0),
            ParameterId::PeakGain => ParamRange::new(-24.0, 24.0, 0.5, 1.0, 0.0),
            ParameterId::PeakQuality => ParamRange::new(0.1, 10.0, 0.05, 1.0, 1.0),
            ParameterId::LowCutSlope | ParameterId::HighCutSlope => {
                ParamRange::new(0.0, (Slope::ALL.len() - 1) as f32, 1.0, 1.0, 0.0)
            }
            ParameterId::LowCutBypassed
            | ParameterId::PeakBypassed
            | ParameterId::HighCutBypassed => ParamRange::new(0.0, 1.0, 1.0, 1.0, 0.0),
        }
    }
}

/// Value range of one parameter
///
/// `interval` snaps values to a grid starting at `min` (0 = continuous).
/// `skew` shapes the normalized 0..1 mapping a host uses for automation;
/// values below 1 give more resolution to the low end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub interval: f32,
    pub skew: f32,
    pub default: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32, interval: f32, skew: f32, default: f32) -> Self {
        Self {
            min,
            max,
            interval,
            skew,
            default,
        }
    }

    /// 20 Hz - 20 kHz, 1 Hz steps, skewed towards the low end
    pub const fn frequency(default: f32) -> Self {
        Self::new(20.0, 20000.0, 1.0, 0.25, default)
    }

    /// Clamp into range and snap to the interval; NaN maps to the default
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }
        let value = value.clamp(self.min, self.max);
        if self.interval <= 0.0 {
            return value;
        }

        // f64 keeps e.g. 0.1 + 18 * 0.05 from landing one ulp off 1.0
        let min = self.min as f64;
        let interval = self.interval as f64;
        let steps = ((value as f64 - min) / interval).round();
        ((min + steps * interval) as f32).clamp(self.min, self.max)
    }

    pub fn to_normalized(&self, value: f32) -> f32 {
        let proportion = (self.clamp(value) - self.min) / (self.max - self.min);
        if self.skew == 1.0 {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    pub fn from_normalized(&self, normalized: f32) -> f32 {
        let mut proportion = normalized.clamp(0.0, 1.0);
        if self.skew != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew).exp();
        }
        self.clamp(self.min + (self.max - self.min) * proportion)
    }
}

/// Lock-free store of every parameter value
pub struct ParameterStore {
    values: [AtomicU32; PARAM_COUNT],
    generation: AtomicU64,
}

impl ParameterStore {
    /// Store holding every parameter's default
    pub fn new() -> Self {
        Self {
            values: core::array::from_fn(|i| {
                AtomicU32::new(ParameterId::ALL[i].range().default.to_bits())
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub fn get(&self, id: ParameterId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    pub fn get_normalized(&self, id: ParameterId) -> f32 {
        id.range().to_normalized(self.get(id))
    }

    /// Write a value, clamped to the parameter's range; returns what was stored
    pub fn set(&self, id: ParameterId, value: f32) -> f32 {
        let value = id.range().clamp(value);
        self.values[id.index()].store(value.to_bits(), Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
        value
    }

    /// Write a value given as a host-normalized 0..1 position
    pub fn set_normalized(&self, id: ParameterId, normalized: f32) -> f32 {
        self.set(id, id.range().from_normalized(normalized))
    }

    /// Write a value by its host identifier
    pub fn set_by_id(&self, id: &str, value: f32) -> EngineResult<f32> {
        let param =
            ParameterId::from_id(id).ok_or_else(|| EngineError::UnknownParameter(id.to_string()))?;
        Ok(self.set(param, value))
    }

    /// Write a host-normalized 0..1 position by its host identifier
    pub fn set_normalized_by_id(&self, id: &str, normalized: f32) -> EngineResult<f32> {
        let param =
            ParameterId::from_id(id).ok_or_else(|| EngineError::UnknownParameter(id.to_string()))?;
        Ok(self.set_normalized(param, normalized))
    }

    fn flag(&self, id: ParameterId) -> bool {
        self.get(id) >= 0.5
    }

    fn set_flag(&self, id: ParameterId, on: bool) {
        self.set(id, if on { 1.0 } else { 0.0 });
    }

    /// Counter bumped on every write
    ///
    /// Load this before [`chain_settings`](Self::chain_settings); if it has
    /// not moved since the last snapshot, neither have the values.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Snapshot of the current values as chain settings
    ///
    /// # Real-time Safety
    /// Relaxed atomic loads only. No allocation, no locks.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            peak_freq: self.get(ParameterId::PeakFreq),
            peak_gain_db: self.get(ParameterId::PeakGain),
            peak_quality: self.get(ParameterId::PeakQuality),
            low_cut_freq: self.get(ParameterId::LowCutFreq),
            high_cut_freq: self.get(ParameterId::HighCutFreq),
            low_cut_slope: Slope::from_choice(self.get(ParameterId::LowCutSlope)),
            high_cut_slope: Slope::from_choice(self.get(ParameterId::HighCutSlope)),
            low_cut_bypassed: self.flag(ParameterId::LowCutBypassed),
            peak_bypassed: self.flag(ParameterId::PeakBypassed),
            high_cut_bypassed: self.flag(ParameterId::HighCutBypassed),
        }
    }

    /// Write every value from a settings record
    pub fn apply_settings(&self, settings: &ChainSettings) {
        self.set(ParameterId::PeakFreq, settings.peak_freq);
        self.set(ParameterId::PeakGain, settings.peak_gain_db);
        self.set(ParameterId::PeakQuality, settings.peak_quality);
        self.set(ParameterId::LowCutFreq, settings.low_cut_freq);
        self.set(ParameterId::HighCutFreq, settings.high_cut_freq);
        self.set(ParameterId::LowCutSlope, settings.low_cut_slope.index() as f32);
        self.set(ParameterId::HighCutSlope, settings.high_cut_slope.index() as f32);
        self.set_flag(ParameterId::LowCutBypassed, settings.low_cut_bypassed);
        self.set_flag(ParameterId::PeakBypassed, settings.peak_bypassed);
        self.set_flag(ParameterId::HighCutBypassed, settings.high_cut_bypassed);
    }

    pub fn reset_to_defaults(&self) {
        for id in ParameterId::ALL {
            self.set(id, id.range().default);
        }
    }

    /// Capture every value for persistence
    pub fn capture_state(&self) -> PluginState {
        let mut state = PluginState::new();
        for id in ParameterId::ALL {
            state.parameters.insert(id.id().to_string(), self.get(id));
        }
        state
    }

    /// Restore values from a captured state
    ///
    /// Missing parameters fall back to their defaults; unknown ones are
    /// skipped.
    pub fn restore_state(&self, state: &PluginState) {
        for (key, _) in state
            .parameters
            .iter()
            .filter(|(key, _)| ParameterId::from_id(key).is_none())
        {
            warn!("Ignoring unknown parameter '{}' in saved state", key);
        }

        for id in ParameterId::ALL {
            let value = state
                .parameters
                .get(id.id())
                .copied()
                .unwrap_or_else(|| id.range().default);
            self.set(id, value);
        }

        debug!("Restored {} parameters (state v{})", PARAM_COUNT, state.version);
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
