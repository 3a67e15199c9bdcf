//! Built-in effects.
//!
//! Every effect consumes one mono input frame per callback and writes the same
//! processed signal to both stereo outputs:
//! - [`PassThrough`] - Input copied unchanged (the default)
//! - [`Delay`] - Feedback comb delay over whole-buffer history
//! - [`Flanger`] - Short sine-modulated delay with feedback
//! - [`Phaser`] - Swept cascade of second-order all-pass stages
//! - [`Reverb`] - Feedback comb with a ring-wrap correction term
//!
//! Delay and reverb look back whole callbacks ("generations") through a
//! [`HistoryRing`](crate::HistoryRing); their delay lengths are counted in
//! generations, not samples.

mod delay;
mod flanger;
mod pass_through;
mod phaser;
mod reverb;

pub use delay::{Delay, DelayParams};
pub use flanger::{Flanger, FlangerParams};
pub use pass_through::PassThrough;
pub use phaser::{all_pass_coefficients, Phaser, PhaserParams, Sweep, SweepDirection, SweepParams};
pub use reverb::{Reverb, ReverbParams};

use crate::error::ConfigError;

/// A history delay must be at least one generation and shorter than the ring.
pub(crate) fn check_delay(effect: &'static str, delay: usize, depth: usize) -> Result<(), ConfigError> {
    if delay == 0 {
        return Err(ConfigError::ZeroDelay { effect });
    }
    if delay >= depth {
        return Err(ConfigError::DelayExceedsHistory { effect, delay, depth });
    }
    Ok(())
}

pub(crate) fn check_finite(effect: &'static str, name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFiniteParameter { effect, name })
    }
}
