//! Feedback comb delay
//!
//! ```text
//! y[n] = gfb * y[n - d] + x[n] + (gff - gfb) * x[n - d]
//! ```
//!
//! `d` counts whole callbacks, so each sample position echoes against the same
//! position `d` buffers earlier.

use crate::effect::{Effect, ProcessContext};
use crate::error::ConfigError;
use crate::history::HistoryRing;

use super::{check_delay, check_finite};

/// Delay tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DelayParams {
    /// Gain applied to the delayed output (`gfb`)
    pub feedback_gain: f32,
    /// Gain of the feed-forward path (`gff`); the delayed input is weighted by `gff - gfb`
    pub feedforward_gain: f32,
    /// Delay length in generations
    pub delay_length: usize,
}

impl Default for DelayParams {
    fn default() -> Self {
        Self {
            feedback_gain: 0.3,
            feedforward_gain: 1.0,
            delay_length: 128,
        }
    }
}

impl DelayParams {
    pub fn validate(&self, depth: usize) -> Result<(), ConfigError> {
        check_finite("delay", "feedback_gain", self.feedback_gain)?;
        check_finite("delay", "feedforward_gain", self.feedforward_gain)?;
        check_delay("delay", self.delay_length, depth)
    }

    /// Weight of the delayed input, `gff - gfb`.
    #[inline]
    pub fn forward_gain(&self) -> f32 {
        self.feedforward_gain - self.feedback_gain
    }
}

/// Feedback comb delay.
pub struct Delay {
    params: DelayParams,
    input: HistoryRing,
    feedback: HistoryRing,
}

impl Delay {
    /// Create a delay for frames of `buffer_size` with `depth` generations of history.
    pub fn new(params: DelayParams, buffer_size: usize, depth: usize) -> Result<Self, ConfigError> {
        params.validate(depth)?;
        Ok(Self {
            params,
            input: HistoryRing::new(buffer_size, depth),
            feedback: HistoryRing::new(buffer_size, depth),
        })
    }

    #[inline]
    pub fn params(&self) -> &DelayParams {
        &self.params
    }
}

impl Effect for Delay {
    fn process(&mut self, _ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        self.input.advance();
        self.feedback.advance();

        let d = self.params.delay_length;
        let gfb = self.params.feedback_gain;
        let gfwd = self.params.forward_gain();

        let positions = self.input.positions();
        let covered = input.len().min(left.len()).min(right.len()).min(positions);

        let frame = input.iter().zip(left.iter_mut()).zip(right.iter_mut());
        for (n, ((&x, l), r)) in frame.take(covered).enumerate() {
            self.input.write(n, x);

            let y = gfb * self.feedback.read_past(n, d) + x + gfwd * self.input.read_past(n, d);

            self.feedback.write(n, y);
            *l = y;
            *r = y;
        }

        // positions a short frame did not reach must not replay older laps
        for n in covered..positions {
            self.input.write(n, 0.0);
            self.feedback.write(n, 0.0);
        }
    }

    fn reset(&mut self) {
        self.input.clear();
        self.feedback.clear();
    }
}
