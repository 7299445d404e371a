//! Persisted Plugin State
//!
//! The host saves and restores an opaque blob; we make it JSON keyed by
//! parameter identifier so older blobs survive parameters being added.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineResult;

/// Current state format version
pub const STATE_VERSION: u32 = 1;

/// Saved parameter values keyed by parameter identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginState {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl PluginState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION,
            parameters: BTreeMap::new(),
        }
    }

    pub fn to_bytes(&self) -> EngineResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl Default for PluginState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_state_bytes_roundtrip() {
        let mut state = PluginState::new();
        state.parameters.insert("Peak Gain".to_string(), -3.5);
        state.parameters.insert("LowCut Slope".to_string(), 2.0);

        let bytes = state.to_bytes().unwrap();
        let restored = PluginState::from_bytes(&bytes).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_state_is_readable_json() {
        let mut state = PluginState::new();
        state.parameters.insert("Peak Freq".to_string(), 1200.0);

        let json = String::from_utf8(state.to_bytes().unwrap()).unwrap();
        assert!(json.contains("\"Peak Freq\":1200.0"));
        assert!(json.contains("\"version\":1"));
    }

    #[test]
    fn test_missing_fields_default() {
        let state = PluginState::from_bytes(b"{}").unwrap();
        assert_eq!(state.version, STATE_VERSION);
        assert!(state.parameters.is_empty());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let result = PluginState::from_bytes(b"\x00\x01 definitely not json");
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
    }
}
