//! Audio Device Enumeration

use cpal::traits::{DeviceTrait, HostTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SUPPORTED_CHANNELS;
use crate::error::{EngineError, EngineResult};

/// Type of audio device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceType {
    Input,
    Output,
}

/// Represents an audio device (input or output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Human-readable device name; CPAL has no separate IDs
    pub name: String,

    /// Whether this is an input or output device
    pub device_type: DeviceType,

    /// Whether this is the system default device
    pub is_default: bool,

    /// Supported sample rates (may be empty if querying failed)
    pub sample_rates: Vec<u32>,

    /// Maximum supported channels
    pub max_channels: u16,
}

impl AudioDevice {
    /// Enumerate all available audio devices
    pub fn enumerate_all() -> EngineResult<Vec<AudioDevice>> {
        let host = cpal::default_host();

        let mut devices = Vec::new();

        let default_input_name = host.default_input_device().and_then(|d| d.name().ok());
        let default_output_name = host.default_output_device().and_then(|d| d.name().ok());

        if let Ok(input_devices) = host.input_devices() {
            devices.extend(input_devices.filter_map(|device| {
                Self::from_cpal_device(&device, DeviceType::Input, default_input_name.as_deref())
                    .ok()
            }));
        }

        if let Ok(output_devices) = host.output_devices() {
            devices.extend(output_devices.filter_map(|device| {
                Self::from_cpal_device(&device, DeviceType::Output, default_output_name.as_deref())
                    .ok()
            }));
        }

        if devices.is_empty() {
            return Err(EngineError::NoDevicesFound);
        }

        debug!("Found {} audio devices", devices.len());
        Ok(devices)
    }

    /// Get the default input device
    pub fn default_input() -> EngineResult<AudioDevice> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or(EngineError::NoDevicesFound)?;
        Self::from_cpal_device(&device, DeviceType::Input, None).map(|mut d| {
            d.is_default = true;
            d
        })
    }

    /// Get the default output device
    pub fn default_output() -> EngineResult<AudioDevice> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or(EngineError::NoDevicesFound)?;
        Self::from_cpal_device(&device, DeviceType::Output, None).map(|mut d| {
            d.is_default = true;
            d
        })
    }

    /// Look up a device by its exact name
    pub fn find_by_name(name: &str, device_type: DeviceType) -> EngineResult<AudioDevice> {
        let devices = Self::enumerate_all()?;
        select_by_name(&devices, name, device_type)
            .cloned()
            .ok_or_else(|| EngineError::DeviceNotFound(name.to_string()))
    }

    /// Whether the device can carry the stereo layout the equalizer needs
    pub fn supports_stereo(&self) -> bool {
        self.max_channels >= SUPPORTED_CHANNELS
    }

    /// Resolve the CPAL handle for this device
    pub fn open(&self) -> EngineResult<cpal::Device> {
        let host = cpal::default_host();
        let found = match self.device_type {
            DeviceType::Input => host
                .input_devices()
                .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
                .find(|d| d.name().map(|n| n == self.name).unwrap_or(false)),
            DeviceType::Output => host
                .output_devices()
                .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?
                .find(|d| d.name().map(|n| n == self.name).unwrap_or(false)),
        };
        found.ok_or_else(|| EngineError::DeviceNotFound(self.name.clone()))
    }

    fn from_cpal_device(
        device: &cpal::Device,
        device_type: DeviceType,
        default_name: Option<&str>,
    ) -> EngineResult<Self> {
        let name = device
            .name()
            .map_err(|e| EngineError::DeviceNotFound(e.to_string()))?;

        let is_default = default_name == Some(name.as_str());

        let (sample_rates, max_channels) = match device_type {
            DeviceType::Input => device
                .supported_input_configs()
                .map(Self::extract_config_info)
                .unwrap_or((vec![], SUPPORTED_CHANNELS)),
            DeviceType::Output => device
                .supported_output_configs()
                .map(Self::extract_config_info)
                .unwrap_or((vec![], SUPPORTED_CHANNELS)),
        };

        Ok(AudioDevice {
            name,
            device_type,
            is_default,
            sample_rates,
            max_channels,
        })
    }

    fn extract_config_info(
        configs: impl Iterator<Item = cpal::SupportedStreamConfigRange>,
    ) -> (Vec<u32>, u16) {
        let mut sample_rates = Vec::new();
        let mut max_channels = 0u16;

        // Common sample rates to check
        const COMMON_RATES: [u32; 6] = [44100, 48000, 88200, 96000, 176400, 192000];

        for config in configs {
            max_channels = max_channels.max(config.channels());

            let min = config.min_sample_rate().0;
            let max = config.max_sample_rate().0;

            for &rate in &COMMON_RATES {
                if rate >= min && rate <= max && !sample_rates.contains(&rate) {
                    sample_rates.push(rate);
                }
            }
        }

        sample_rates.sort_unstable();
        (sample_rates, max_channels)
    }
}

/// First device of `device_type` whose name is exactly `name`
pub fn select_by_name<'a>(
    devices: &'a [AudioDevice],
    name: &str,
    device_type: DeviceType,
) -> Option<&'a AudioDevice> {
    devices
        .iter()
        .find(|d| d.device_type == device_type && d.name == name)
}
