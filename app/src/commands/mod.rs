//! Subcommands

pub mod devices;
pub mod params;
pub mod response;
pub mod run;

use std::path::Path;

use anyhow::Context;
use equwu_core::{ParameterStore, PluginState};
use tracing::info;

/// Parse a `key=value` parameter assignment
pub fn parse_key_val(s: &str) -> Result<(String, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter format: '{}' (expected key=value)", s))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid value for '{}': {}", key, e))?;
    Ok((key.trim().to_string(), value))
}

/// Build a parameter store from an optional state file plus overrides
///
/// `overrides` are plain values; `normalized` are 0..1 positions as a host
/// automation lane would send them, applied last. A state file that does
/// not exist yet is not an error; it gets written on exit.
pub fn load_params(
    state_file: Option<&Path>,
    overrides: &[(String, f32)],
    normalized: &[(String, f32)],
) -> anyhow::Result<ParameterStore> {
    let params = ParameterStore::new();

    if let Some(path) = state_file.filter(|p| p.exists()) {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let state = PluginState::from_bytes(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;
        params.restore_state(&state);
        info!("Loaded state from {}", path.display());
    }

    for (id, value) in overrides {
        let stored = params.set_by_id(id, *value)?;
        if stored != *value {
            println!("  {} = {} (clamped from {})", id, stored, value);
        }
    }

    for (id, position) in normalized {
        let stored = params.set_normalized_by_id(id, *position)?;
        println!("  {} = {} (normalized {})", id, stored, position);
    }

    Ok(params)
}

pub fn save_params(params: &ParameterStore, path: &Path) -> anyhow::Result<()> {
    let bytes = params.capture_state().to_bytes()?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("Saved state to {}", path.display());
    Ok(())
}
