//! Stream Events
//!
//! Events flow from the audio callbacks -> control thread over a
//! `crossbeam-channel`. Callbacks only ever `try_send`, so hand them a
//! bounded channel: a full channel drops the event instead of allocating.

use serde::{Deserialize, Serialize};

/// Events sent from the audio stream to the control thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Event {
    /// Both callbacks are running
    Started { sample_rate: u32, buffer_size: u32 },

    /// Stream torn down
    Stopped,

    /// Error reported by the audio backend
    Error { message: String },

    /// Peak levels (left, right) of the last output buffer, 0.0 - 1.0+
    LevelUpdate { left: f32, right: f32 },

    /// Output callback ran dry and played silence for the missing frames
    BufferUnderrun,

    /// Capture callback found the ring buffer full and dropped frames
    BufferOverflow,
}

impl Event {
    /// Create an error event from any error type
    pub fn error<E: std::fmt::Display>(err: E) -> Self {
        Event::Error {
            message: err.to_string(),
        }
    }
}
