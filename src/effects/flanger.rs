//! Flanger: short sine-modulated delay with feedback
//!
//! Unlike the generation-based effects this works on a per-sample delay line,
//! since the modulated delay is only a few milliseconds long.

use core::f32::consts::PI;

use crate::effect::{Effect, ProcessContext};
use crate::error::ConfigError;

use super::check_finite;

/// Flanger tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlangerParams {
    /// LFO rate in Hz (0.05 to 10)
    pub rate_hz: f32,
    /// Modulation depth (0.0 to 1.0)
    pub depth: f32,
    /// Feedback into the delay line (-0.95 to 0.95)
    pub feedback: f32,
    /// 0.0 = dry only, 1.0 = wet only
    pub wet_dry: f32,
    /// Delay with the LFO at its minimum, in milliseconds
    pub base_delay_ms: f32,
    /// Delay with the LFO at full depth and its maximum, in milliseconds
    pub max_delay_ms: f32,
}

impl Default for FlangerParams {
    fn default() -> Self {
        Self {
            rate_hz: 0.5,
            depth: 0.7,
            feedback: 0.5,
            wet_dry: 0.5,
            base_delay_ms: 1.0,
            max_delay_ms: 10.0,
        }
    }
}

impl FlangerParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_finite("flanger", "rate_hz", self.rate_hz)?;
        check_finite("flanger", "depth", self.depth)?;
        check_finite("flanger", "feedback", self.feedback)?;
        check_finite("flanger", "wet_dry", self.wet_dry)?;
        let (base, max) = (self.base_delay_ms, self.max_delay_ms);
        if !(base.is_finite() && max.is_finite() && base > 0.0 && base < max) {
            return Err(ConfigError::InvalidFlangerDelay { base_ms: base, max_ms: max });
        }
        Ok(())
    }

    /// Pull each knob into its usable range.
    fn clamped(self) -> Self {
        Self {
            rate_hz: self.rate_hz.clamp(0.05, 10.0),
            depth: self.depth.clamp(0.0, 1.0),
            feedback: self.feedback.clamp(-0.95, 0.95),
            wet_dry: self.wet_dry.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Modulated delay line flanger.
pub struct Flanger {
    params: FlangerParams,
    line: Vec<f32>,
    write_pos: usize,
    lfo_phase: f32,
    base_delay: f32,
    max_modulation: f32,
}

impl Flanger {
    pub fn new(params: FlangerParams, sample_rate: u32) -> Result<Self, ConfigError> {
        params.validate()?;
        let params = params.clamped();

        let samples_per_ms = sample_rate as f32 / 1000.0;
        let base_delay = params.base_delay_ms * samples_per_ms;
        let max_delay = params.max_delay_ms * samples_per_ms;
        // room for the interpolation neighbour and the slot being written
        let line_len = max_delay.ceil() as usize + 2;

        Ok(Self {
            params,
            line: vec![0.0; line_len],
            write_pos: 0,
            lfo_phase: 0.0,
            base_delay,
            max_modulation: max_delay - base_delay,
        })
    }

    #[inline]
    pub fn params(&self) -> &FlangerParams {
        &self.params
    }

    /// Read `delay` samples behind the write head, linearly interpolated.
    fn read(&self, delay: f32) -> f32 {
        let len = self.line.len();
        let delay = delay.clamp(1.0, (len - 2) as f32);

        let mut pos = self.write_pos as f32 - delay;
        if pos < 0.0 {
            pos += len as f32;
        }

        let i0 = pos.floor() as usize % len;
        let frac = pos - pos.floor();
        let s0 = self.line[i0];
        let s1 = self.line[(i0 + 1) % len];
        s0 * (1.0 - frac) + s1 * frac
    }
}

impl Effect for Flanger {
    fn process(&mut self, ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        let wet = self.params.wet_dry;
        let dry = 1.0 - wet;
        let phase_step = self.params.rate_hz / ctx.sample_rate as f32;

        for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
            let lfo = ((self.lfo_phase * 2.0 * PI).sin() * 0.5 + 0.5) * self.params.depth;
            let delayed = self.read(self.base_delay + lfo * self.max_modulation);

            let y = x * dry + delayed * wet;
            *l = y;
            *r = y;

            self.line[self.write_pos] = x + delayed * self.params.feedback;
            self.write_pos = (self.write_pos + 1) % self.line.len();

            self.lfo_phase += phase_step;
            if self.lfo_phase >= 1.0 {
                self.lfo_phase -= 1.0;
            }
        }
    }

    fn reset(&mut self) {
        self.line.fill(0.0);
        self.write_pos = 0;
        self.lfo_phase = 0.0;
    }
}
