//! Comb filter reverb
//!
//! ```text
//! y[n] = x[n - d] + g * y[n - d]                 ring slot >= d
//! y[n] = -g * x[n] + x[n - d] + g * y[n - d]     ring slot <  d
//! ```
//!
//! The second form applies while the current ring slot is within the first `d`
//! slots of a lap, where the delayed read wraps around the end of the ring.

use crate::effect::{Effect, ProcessContext};
use crate::error::ConfigError;
use crate::history::HistoryRing;

use super::{check_delay, check_finite};

/// Reverb tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReverbParams {
    /// Comb gain `g`, applied to the fed-back output and the wrap correction
    pub gain: f32,
    /// Comb length in generations
    pub delay_length: usize,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            gain: 0.7,
            delay_length: 32,
        }
    }
}

impl ReverbParams {
    pub fn validate(&self, depth: usize) -> Result<(), ConfigError> {
        check_finite("reverb", "gain", self.gain)?;
        check_delay("reverb", self.delay_length, depth)
    }
}

/// Single feedback comb.
pub struct Reverb {
    params: ReverbParams,
    input: HistoryRing,
    feedback: HistoryRing,
}

impl Reverb {
    pub fn new(params: ReverbParams, buffer_size: usize, depth: usize) -> Result<Self, ConfigError> {
        params.validate(depth)?;
        Ok(Self {
            params,
            input: HistoryRing::new(buffer_size, depth),
            feedback: HistoryRing::new(buffer_size, depth),
        })
    }

    #[inline]
    pub fn params(&self) -> &ReverbParams {
        &self.params
    }
}

impl Effect for Reverb {
    fn process(&mut self, _ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        self.input.advance();
        self.feedback.advance();

        let d = self.params.delay_length;
        let g = self.params.gain;
        let wrapped = self.input.slot() < d;

        let positions = self.input.positions();
        let covered = input.len().min(left.len()).min(right.len()).min(positions);

        let frame = input.iter().zip(left.iter_mut()).zip(right.iter_mut());
        for (n, ((&x, l), r)) in frame.take(covered).enumerate() {
            self.input.write(n, x);

            let comb = self.input.read_past(n, d) + g * self.feedback.read_past(n, d);
            let y = if wrapped { comb - g * x } else { comb };

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

#[cfg(test)]
mod tests {
    use super::*;

    fn run(reverb: &mut Reverb, input: &[f32]) -> f32 {
        let ctx = ProcessContext { sample_rate: 44100, buffer_size: input.len() };
        let mut left = vec![0.0; input.len()];
        let mut right = vec![0.0; input.len()];
        reverb.process(&ctx, input, &mut left, &mut right);
        assert_eq!(left, right);
        left[0]
    }

    fn small() -> Reverb {
        // depth 8, d = 3: slots 0..3 take the corrected form
        let params = ReverbParams { delay_length: 3, ..ReverbParams::default() };
        Reverb::new(params, 2, 8).unwrap()
    }

    #[test]
    fn default_params() {
        let p = ReverbParams::default();
        assert_eq!(p.gain, 0.7);
        assert_eq!(p.delay_length, 32);
    }

    #[test]
    fn first_lap_subtracts_scaled_input() {
        let mut reverb = small();
        // slot 1, history still silent
        let y = run(&mut reverb, &[1.0, 0.0]);
        assert!((y - -0.7).abs() < 1e-6);
    }

    #[test]
    fn comb_echo_once_past_delay_length() {
        let mut reverb = small();
        run(&mut reverb, &[1.0, 0.0]); // slot 1: y = -0.7
        run(&mut reverb, &[0.0, 0.0]); // slot 2
        run(&mut reverb, &[0.0, 0.0]); // slot 3
        let y = run(&mut reverb, &[0.0, 0.0]); // slot 4 reads slot 1

        let expected = 1.0 + 0.7 * -0.7f32;
        assert!((y - expected).abs() < 1e-6, "got {}, want {}", y, expected);
    }

    /// Once the ring laps, slots below `d` take the corrected form again and
    /// read history that wraps around the end of the ring.
    #[test]
    fn correction_applies_on_every_lap() {
        let mut reverb = small();
        run(&mut reverb, &[1.0, 0.0]); // slot 1: -0.7
        run(&mut reverb, &[0.0, 0.0]); // slot 2: 0
        run(&mut reverb, &[0.0, 0.0]); // slot 3: 0
        let y4 = run(&mut reverb, &[0.0, 0.0]); // slot 4: 1 + 0.7 * -0.7
        run(&mut reverb, &[0.0, 0.0]); // slot 5
        run(&mut reverb, &[0.0, 0.0]); // slot 6
        let y7 = run(&mut reverb, &[0.0, 0.0]); // slot 7 reads slot 4
        assert!((y7 - 0.7 * y4).abs() < 1e-6);

        run(&mut reverb, &[0.0, 0.0]); // slot 0
        run(&mut reverb, &[0.0, 0.0]); // slot 1
        let y = run(&mut reverb, &[0.5, 0.0]); // slot 2 reads slot 7

        let expected = -0.7 * 0.5 + 0.0 + 0.7 * y7;
        assert!((y - expected).abs() < 1e-6, "got {}, want {}", y, expected);
    }

    #[test]
    fn short_frame_clears_uncovered_positions() {
        fn frame(reverb: &mut Reverb, input: &[f32]) -> Vec<f32> {
            let ctx = ProcessContext { sample_rate: 44100, buffer_size: input.len() };
            let (mut l, mut r) = (vec![0.0; input.len()], vec![0.0; input.len()]);
            reverb.process(&ctx, input, &mut l, &mut r);
            l
        }

        let mut reverb = small();
        // depth 8, d = 3, position 1 only
        frame(&mut reverb, &[0.0, 1.0]); // slot 1: -0.7
        frame(&mut reverb, &[0.0, 0.0]);
        frame(&mut reverb, &[0.0, 0.0]);
        let y4 = frame(&mut reverb, &[0.0, 0.0]); // slot 4 reads slot 1
        assert!((y4[1] - (1.0 + 0.7 * -0.7f32)).abs() < 1e-6);

        // one full lap later, slot 1 is overwritten by a one-sample frame
        for _ in 5..9 {
            frame(&mut reverb, &[0.0, 0.0]);
        }
        frame(&mut reverb, &[0.0]); // slot 1
        frame(&mut reverb, &[0.0, 0.0]);
        frame(&mut reverb, &[0.0, 0.0]);

        // slot 4 reads slot 1 again: input and feedback there are silent now
        let y = frame(&mut reverb, &[0.0, 0.0]);
        assert_eq!(y[1], 0.0);
    }

    #[test]
    fn silence_in_silence_out() {
        let mut reverb = Reverb::new(ReverbParams::default(), 8, 500).unwrap();
        for _ in 0..1200 {
            assert_eq!(run(&mut reverb, &[0.0; 8]), 0.0);
        }
    }

    #[test]
    fn rejects_delay_past_history() {
        let params = ReverbParams { delay_length: 600, ..ReverbParams::default() };
        assert!(matches!(
            Reverb::new(params, 128, 500),
            Err(ConfigError::DelayExceedsHistory { effect: "reverb", delay: 600, depth: 500 })
        ));
    }
}
