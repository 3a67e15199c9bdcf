//! Engine configuration.
//!
//! Everything the DSP core needs is read once from an [`EngineConfig`] before
//! the stream starts. Nothing here is consulted from the audio callback.

use crate::effect::{EffectKind, EffectProcessor, ProcessContext};
use crate::effects::{
    Delay, DelayParams, Flanger, FlangerParams, PassThrough, Phaser, PhaserParams, Reverb,
    ReverbParams,
};
use crate::error::ConfigError;

/// Configuration for an [`Engine`](crate::Engine).
///
/// # Example
///
/// ```
/// use effektor::{EffectKind, EngineConfig};
///
/// let config = EngineConfig::default()
///     .with_effect(EffectKind::Delay)
///     .with_sample_rate(48000)
///     .with_buffer_size(256);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Effect run on every callback
    pub effect: EffectKind,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Samples per callback frame
    pub buffer_size: usize,
    /// Generations of history kept by delay and reverb
    pub history_depth: usize,
    pub delay: DelayParams,
    pub reverb: ReverbParams,
    pub phaser: PhaserParams,
    pub flanger: FlangerParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            effect: EffectKind::None,
            sample_rate: 44100,
            buffer_size: 128,
            history_depth: 500,
            delay: DelayParams::default(),
            reverb: ReverbParams::default(),
            phaser: PhaserParams::default(),
            flanger: FlangerParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_effect(mut self, effect: EffectKind) -> Self {
        self.effect = effect;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_history_depth(mut self, depth: usize) -> Self {
        self.history_depth = depth;
        self
    }

    pub fn with_delay(mut self, params: DelayParams) -> Self {
        self.delay = params;
        self
    }

    pub fn with_reverb(mut self, params: ReverbParams) -> Self {
        self.reverb = params;
        self
    }

    pub fn with_phaser(mut self, params: PhaserParams) -> Self {
        self.phaser = params;
        self
    }

    pub fn with_flanger(mut self, params: FlangerParams) -> Self {
        self.flanger = params;
        self
    }

    /// The per-callback context this configuration describes.
    pub fn context(&self) -> ProcessContext {
        ProcessContext {
            sample_rate: self.sample_rate,
            buffer_size: self.buffer_size,
        }
    }

    /// Check the whole configuration, including effects that are not selected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        if self.history_depth < 2 {
            return Err(ConfigError::HistoryTooShallow { depth: self.history_depth });
        }
        self.delay.validate(self.history_depth)?;
        self.reverb.validate(self.history_depth)?;
        self.phaser.validate()?;
        self.flanger.validate()
    }

    /// Validate and allocate the selected effect.
    pub fn build_effect(&self) -> Result<EffectProcessor, ConfigError> {
        self.validate()?;
        let (size, depth) = (self.buffer_size, self.history_depth);
        Ok(match self.effect {
            EffectKind::None => EffectProcessor::PassThrough(PassThrough),
            EffectKind::Delay => EffectProcessor::Delay(Delay::new(self.delay, size, depth)?),
            EffectKind::Flanger => {
                EffectProcessor::Flanger(Flanger::new(self.flanger, self.sample_rate)?)
            }
            EffectKind::Phaser => EffectProcessor::Phaser(Phaser::new(self.phaser.clone(), size)?),
            EffectKind::Reverb => EffectProcessor::Reverb(Reverb::new(self.reverb, size, depth)?),
        })
    }
}
