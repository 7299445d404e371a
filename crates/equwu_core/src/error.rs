//! Engine Error Types

use thiserror::Error;

/// Errors that can occur outside the real-time path
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No audio devices found")]
    NoDevicesFound,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),

    #[error("Stream configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported channel layout: {input} in / {output} out (only stereo is supported)")]
    UnsupportedLayout { input: u16, output: u16 },

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid state blob: {0}")]
    InvalidState(#[from] serde_json::Error),

    #[error("DSP error: {0}")]
    Dsp(#[from] equwu_dsp::DspError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
