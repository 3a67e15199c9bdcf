//! CPAL device discovery.
//!
//! [`CpalDevice`] wraps an input or output device together with its default
//! stream config. Pass one of each to [`LiveStream::start`](crate::LiveStream::start).
//!
//! # Example: List Devices
//!
//! ```no_run
//! use effektor::CpalDevice;
//!
//! for device in CpalDevice::list_inputs() {
//!     println!("in:  {} ({} Hz, {} ch)", device.name(), device.sample_rate(), device.channels());
//! }
//! for device in CpalDevice::list_outputs() {
//!     println!("out: {} ({} Hz, {} ch)", device.name(), device.sample_rate(), device.channels());
//! }
//! ```

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleFormat, SupportedStreamConfig};

/// Which way audio flows through a device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// A discovered audio device.
pub struct CpalDevice {
    device: cpal::Device,
    config: SupportedStreamConfig,
    direction: Direction,

    name: String,
    sample_rate: u32,
    channels: u16,
}

impl CpalDevice {
    /// Get the system's default capture device.
    ///
    /// Returns `None` if no input device is available.
    pub fn default_input() -> Option<Self> {
        let device = cpal::default_host().default_input_device()?;
        Self::open(device, Direction::Input)
    }

    /// Get the system's default playback device.
    ///
    /// Returns `None` if no output device is available.
    pub fn default_output() -> Option<Self> {
        let device = cpal::default_host().default_output_device()?;
        Self::open(device, Direction::Output)
    }

    /// List all capture devices that report a default config.
    pub fn list_inputs() -> Vec<Self> {
        cpal::default_host()
            .input_devices()
            .map(|devices| {
                devices
                    .filter_map(|device| Self::open(device, Direction::Input))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// List all playback devices that report a default config.
    pub fn list_outputs() -> Vec<Self> {
        cpal::default_host()
            .output_devices()
            .map(|devices| {
                devices
                    .filter_map(|device| Self::open(device, Direction::Output))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn open(device: cpal::Device, direction: Direction) -> Option<Self> {
        let config = match direction {
            Direction::Input => device.default_input_config().ok()?,
            Direction::Output => device.default_output_config().ok()?,
        };
        let name = device.name().unwrap_or_else(|_| "Unknown".into());

        Some(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            name,
            direction,
            device,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.config.sample_format()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn device(&self) -> &cpal::Device {
        &self.device
    }

    pub(crate) fn stream_config(&self) -> cpal::StreamConfig {
        self.config.config()
    }
}

impl core::fmt::Debug for CpalDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CpalDevice")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}
