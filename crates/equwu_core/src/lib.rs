//! EQUwU Core - Host Glue and Audio Transport
//!
//! This crate wraps the real-time filter chain from `equwu_dsp` with
//! everything a host needs around it:
//! - Lock-free parameter store read by the audio thread once per block
//! - Lifecycle glue (`prepare_to_play`, `release_resources`, state blobs)
//! - Audio device enumeration and a standalone duplex stream (via CPAL)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Control Thread                         │
//! │   ParameterStore::set ──atomics──▶   ◀──events── Receiver   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ generation counter
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   Capture ──rtrb──▶ EqProcessor ──▶ Output                  │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod device;
mod error;
mod message;
mod params;
mod processor;
mod state;
mod stream;

pub use config::{is_layout_supported, EngineConfig, StreamConfig, SUPPORTED_CHANNELS};
pub use device::{select_by_name, AudioDevice, DeviceType};
pub use error::{EngineError, EngineResult};
pub use message::Event;
pub use params::{ParamRange, ParameterId, ParameterStore, PARAM_COUNT};
pub use processor::EqProcessor;
pub use state::{PluginState, STATE_VERSION};
pub use stream::{AudioStream, SharedState};

// Re-export DSP types for convenience
pub use equwu_dsp::{AudioProcessor, ChainSettings, DspError, ProcessContext, Slope};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        // Verify public API is accessible
        let _config = EngineConfig::default();
        let _params = ParameterStore::new();
        let _state = PluginState::new();
    }
}
