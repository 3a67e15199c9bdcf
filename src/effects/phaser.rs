//! Swept all-pass phaser
//!
//! A cascade of second-order all-pass stages, each implementing
//!
//! ```text
//! y[n] = a2*x[n] + a1*x[n-1] + x[n-2] - a1*y[n-1] - a2*y[n-2]
//! a1   = -2 R cos(theta),  a2 = R^2,  theta = 2 pi f / fs
//! ```
//!
//! Every stage's resonant frequency `f` is its base frequency times a sweep
//! scale that moves back and forth between roughly 1x and 4x, once per
//! callback. Stage 0 is fed the input plus a scaled copy of the cascade's
//! previous output at the same frame position; the final stage is mixed
//! against the dry input to form the output.

use core::f64::consts::PI;

use crate::effect::{Effect, ProcessContext};
use crate::error::ConfigError;

use super::check_finite;

/// Which way the sweep angle is moving.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SweepDirection {
    Increasing,
    Decreasing,
}

/// Sweep tunables. Angles are in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweepParams {
    /// Angle change per callback
    pub step: f64,
    /// Turn back to increasing below this angle
    pub lower: f64,
    /// Turn back to decreasing above this angle
    pub upper: f64,
    /// Amplitude of the scale around `center`
    pub depth: f64,
    /// Scale at the sweep's midpoint
    pub center: f64,
}

impl Default for SweepParams {
    fn default() -> Self {
        Self {
            step: 0.01,
            lower: 0.2,
            upper: 6.2,
            depth: 1.5,
            center: 2.5,
        }
    }
}

impl SweepParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = self.step.is_finite()
            && self.step > 0.0
            && self.lower.is_finite()
            && self.upper.is_finite()
            && self.lower < self.upper;
        if !ok {
            return Err(ConfigError::InvalidSweep {
                lower: self.lower,
                upper: self.upper,
                step: self.step,
            });
        }
        if !(self.depth.is_finite() && self.center.is_finite()) {
            return Err(ConfigError::NonFiniteParameter { effect: "phaser", name: "sweep" });
        }
        Ok(())
    }
}

/// Frequency-scale oscillator, reflected between two angles.
///
/// The scale is `depth * sin(angle) + center`; with the defaults that is
/// `1.5 sin(angle) + 2.5`, between 1 and 4.
#[derive(Clone, Debug)]
pub struct Sweep {
    params: SweepParams,
    angle: f64,
    direction: SweepDirection,
    scale: f64,
}

impl Sweep {
    /// Start at angle 0, increasing, with the scale already at `center`.
    pub fn new(params: SweepParams) -> Self {
        Self::starting_at(params, 0.0, SweepDirection::Increasing)
    }

    pub fn starting_at(params: SweepParams, angle: f64, direction: SweepDirection) -> Self {
        let mut sweep = Self {
            params,
            angle,
            direction,
            scale: 0.0,
        };
        sweep.scale = sweep.scale_at(angle);
        sweep
    }

    /// Step the angle, reflect at the bounds, and recompute the scale.
    pub fn advance(&mut self) -> f64 {
        match self.direction {
            SweepDirection::Increasing => self.angle += self.params.step,
            SweepDirection::Decreasing => self.angle -= self.params.step,
        }

        if self.angle > self.params.upper {
            self.direction = SweepDirection::Decreasing;
        } else if self.angle < self.params.lower {
            self.direction = SweepDirection::Increasing;
        }

        self.scale = self.scale_at(self.angle);
        self.scale
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn direction(&self) -> SweepDirection {
        self.direction
    }

    /// Current frequency multiplier.
    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn scale_at(&self, angle: f64) -> f64 {
        self.params.depth * angle.sin() + self.params.center
    }
}

/// Compute `(a1, a2)` for one all-pass stage.
///
/// `resonance` is the pole radius `R`, `base_frequency` is in Hz and is
/// multiplied by `sweep_scale` before conversion to an angle.
pub fn all_pass_coefficients(
    resonance: f64,
    base_frequency: f64,
    sweep_scale: f64,
    sample_rate: u32,
) -> (f32, f32) {
    let res_freq = sweep_scale * base_frequency;
    let theta = (res_freq * 2.0 * PI) / sample_rate as f64;
    let a1 = (-2.0 * resonance * theta.cos()) as f32;
    let a2 = (resonance * resonance) as f32;
    (a1, a2)
}

/// Phaser tunables.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaserParams {
    /// Pole radius per stage
    pub resonance: Vec<f64>,
    /// Unswept resonant frequency per stage, in Hz
    pub base_frequencies: Vec<f64>,
    /// Gain of the cascade output fed back into stage 0
    pub feedback: f32,
    /// Gain of the final stage in the output mix
    pub wet_gain: f32,
    /// Gain of the dry input subtracted in the output mix
    pub dry_gain: f32,
    pub sweep: SweepParams,
}

impl Default for PhaserParams {
    fn default() -> Self {
        Self::twelve_stage()
    }
}

impl PhaserParams {
    fn with_stages(resonance: &[f64], base_frequencies: &[f64]) -> Self {
        Self {
            resonance: resonance.to_vec(),
            base_frequencies: base_frequencies.to_vec(),
            feedback: 0.7,
            wet_gain: 1.0,
            dry_gain: 1.1,
            sweep: SweepParams::default(),
        }
    }

    pub fn four_stage() -> Self {
        Self::with_stages(&[0.9, 0.98, 0.8, 0.9], &[300.0, 800.0, 1000.0, 4000.0])
    }

    pub fn eight_stage() -> Self {
        Self::with_stages(
            &[0.9, 0.95, 0.98, 0.9, 0.8, 0.98, 0.9, 0.9],
            &[100.0, 300.0, 800.0, 850.0, 1000.0, 1200.0, 2000.0, 4000.0],
        )
    }

    pub fn twelve_stage() -> Self {
        Self::with_stages(
            &[0.9, 0.85, 0.95, 0.85, 0.9, 0.95, 0.8, 0.95, 0.98, 0.8, 0.9, 0.95],
            &[
                100.0, 250.0, 450.0, 900.0, 920.0, 1000.0, 1200.0, 1500.0, 1800.0, 2000.0, 3500.0,
                4000.0,
            ],
        )
    }

    #[inline]
    pub fn stage_count(&self) -> usize {
        self.resonance.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resonance.len() != self.base_frequencies.len() {
            return Err(ConfigError::StageCountMismatch {
                resonances: self.resonance.len(),
                frequencies: self.base_frequencies.len(),
            });
        }
        if self.resonance.is_empty() {
            return Err(ConfigError::NoPhaserStages);
        }
        for (stage, (&r, &f)) in self.resonance.iter().zip(&self.base_frequencies).enumerate() {
            if !(r > 0.0 && r < 1.0) {
                return Err(ConfigError::UnstableResonance { stage, value: r });
            }
            if !(f.is_finite() && f > 0.0) {
                return Err(ConfigError::InvalidFrequency { stage, value: f });
            }
        }
        check_finite("phaser", "feedback", self.feedback)?;
        check_finite("phaser", "wet_gain", self.wet_gain)?;
        check_finite("phaser", "dry_gain", self.dry_gain)?;
        self.sweep.validate()
    }
}

/// Two samples of input and output memory, carried between callbacks.
#[derive(Clone, Copy, Debug, Default)]
struct StageState {
    x: [f32; 2],
    y: [f32; 2],
}

/// Multi-stage swept phaser.
pub struct Phaser {
    params: PhaserParams,
    stages: Vec<StageState>,
    /// Working input of the current stage; slots 0 and 1 hold the previous frame's tail.
    x: Vec<f32>,
    /// Working output of the current stage, laid out like `x`. Between callbacks
    /// it holds the final stage's output, which stage 0 reads for feedback.
    y: Vec<f32>,
    sweep: Sweep,
}

impl Phaser {
    pub fn new(params: PhaserParams, buffer_size: usize) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            stages: vec![StageState::default(); params.stage_count()],
            x: vec![0.0; buffer_size + 2],
            y: vec![0.0; buffer_size + 2],
            sweep: Sweep::new(params.sweep),
            params,
        })
    }

    #[inline]
    pub fn params(&self) -> &PhaserParams {
        &self.params
    }

    #[inline]
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }
}

impl Effect for Phaser {
    fn process(&mut self, ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        let Self { params, stages, x, y, sweep } = self;

        let len = input.len().min(left.len()).min(right.len()).min(x.len() - 2);
        let last = stages.len() - 1;
        let scale = sweep.scale();

        for (stage, state) in stages.iter_mut().enumerate() {
            x[..2].copy_from_slice(&state.x);
            y[..2].copy_from_slice(&state.y);

            let (a1, a2) = all_pass_coefficients(
                params.resonance[stage],
                params.base_frequencies[stage],
                scale,
                ctx.sample_rate,
            );

            for i in 2..len + 2 {
                let dry = input[i - 2];
                // y[i] still holds the previous stage's output, or for stage 0
                // the last callback's cascade output
                x[i] = if stage == 0 { dry + params.feedback * y[i] } else { y[i] };

                y[i] = a2 * x[i] + a1 * x[i - 1] + x[i - 2] - a1 * y[i - 1] - a2 * y[i - 2];

                if stage == last {
                    let out = params.wet_gain * y[i] - params.dry_gain * dry;
                    left[i - 2] = out;
                    right[i - 2] = out;
                }
            }

            state.x = [x[len], x[len + 1]];
            state.y = [y[len], y[len + 1]];
        }

        sweep.advance();
    }

    fn reset(&mut self) {
        self.stages.fill(StageState::default());
        self.x.fill(0.0);
        self.y.fill(0.0);
        self.sweep = Sweep::new(self.params.sweep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 44100;

    fn ctx(buffer_size: usize) -> ProcessContext {
        ProcessContext { sample_rate: SAMPLE_RATE, buffer_size }
    }

    #[test]
    fn coefficients_match_closed_form() {
        let (a1, a2) = all_pass_coefficients(0.9, 300.0, 1.0, 44100);

        let theta = 2.0 * PI * 300.0 / 44100.0;
        let expected_a1 = -2.0 * 0.9 * theta.cos();

        assert!((a1 as f64 - expected_a1).abs() < 1e-6, "a1 = {}", a1);
        assert!((a2 as f64 - 0.81).abs() < 1e-6, "a2 = {}", a2);
    }

    #[test]
    fn coefficients_follow_sweep_scale() {
        let (a1, _) = all_pass_coefficients(0.9, 300.0, 2.0, 44100);
        let (b1, _) = all_pass_coefficients(0.9, 600.0, 1.0, 44100);
        assert_eq!(a1, b1);
    }

    #[test]
    fn sweep_turns_down_past_upper_bound() {
        let mut sweep = Sweep::starting_at(SweepParams::default(), 6.15, SweepDirection::Increasing);

        let mut steps = 0;
        while sweep.direction() == SweepDirection::Increasing {
            sweep.advance();
            steps += 1;
            assert!(steps < 10, "sweep never turned");
        }
        assert!(sweep.angle() > 6.2);
        assert!(sweep.angle() < 6.22);

        sweep.advance();
        assert!(sweep.angle() < 6.22);
        assert_eq!(sweep.direction(), SweepDirection::Decreasing);
    }

    #[test]
    fn sweep_turns_up_past_lower_bound() {
        let mut sweep = Sweep::starting_at(SweepParams::default(), 0.25, SweepDirection::Decreasing);

        let mut steps = 0;
        while sweep.direction() == SweepDirection::Decreasing {
            sweep.advance();
            steps += 1;
            assert!(steps < 10, "sweep never turned");
        }
        assert!(sweep.angle() < 0.2);
        assert!(sweep.angle() > 0.18);
    }

    #[test]
    fn sweep_scale_stays_between_one_and_four() {
        let mut sweep = Sweep::new(SweepParams::default());
        assert!((sweep.scale() - 2.5).abs() < 1e-12);
        for _ in 0..5000 {
            let s = sweep.advance();
            assert!((1.0 - 1e-9..=4.0 + 1e-9).contains(&s), "scale {}", s);
        }
    }

    #[test]
    fn first_frame_uses_scale_of_starting_angle() {
        let params = PhaserParams {
            resonance: vec![0.9],
            base_frequencies: vec![300.0],
            ..PhaserParams::default()
        };
        let mut phaser = Phaser::new(params, 1).unwrap();
        assert_eq!(phaser.sweep().scale(), 2.5);

        // y[0] = a2 * x[0] for a silent history
        let (mut l, mut r) = ([0.0], [0.0]);
        phaser.process(&ctx(1), &[1.0], &mut l, &mut r);
        let (_, a2) = all_pass_coefficients(0.9, 300.0, 2.5, SAMPLE_RATE);
        assert!((l[0] - (a2 - 1.1)).abs() < 1e-6);
    }

    #[test]
    fn presets_have_matching_tables() {
        assert_eq!(PhaserParams::four_stage().stage_count(), 4);
        assert_eq!(PhaserParams::eight_stage().stage_count(), 8);
        assert_eq!(PhaserParams::twelve_stage().stage_count(), 12);
        for p in [PhaserParams::four_stage(), PhaserParams::eight_stage(), PhaserParams::twelve_stage()] {
            assert!(p.validate().is_ok());
        }
    }

    #[test]
    fn rejects_mismatched_tables() {
        let mut params = PhaserParams::four_stage();
        params.base_frequencies.pop();
        assert_eq!(
            Phaser::new(params, 128).err(),
            Some(ConfigError::StageCountMismatch { resonances: 4, frequencies: 3 })
        );
    }

    #[test]
    fn rejects_empty_and_unstable_stages() {
        let empty = PhaserParams { resonance: vec![], base_frequencies: vec![], ..PhaserParams::default() };
        assert_eq!(Phaser::new(empty, 128).err(), Some(ConfigError::NoPhaserStages));

        let mut unstable = PhaserParams::four_stage();
        unstable.resonance[2] = 1.2;
        assert!(matches!(
            Phaser::new(unstable, 128),
            Err(ConfigError::UnstableResonance { stage: 2, .. })
        ));
    }

    #[test]
    fn rejects_inverted_sweep() {
        let mut params = PhaserParams::four_stage();
        params.sweep.lower = 7.0;
        assert!(matches!(Phaser::new(params, 128), Err(ConfigError::InvalidSweep { .. })));
    }

    #[test]
    fn silence_in_silence_out() {
        let mut phaser = Phaser::new(PhaserParams::default(), 64).unwrap();
        let input = [0.0; 64];
        let (mut l, mut r) = ([1.0; 64], [1.0; 64]);
        for _ in 0..100 {
            phaser.process(&ctx(64), &input, &mut l, &mut r);
            assert!(l.iter().chain(r.iter()).all(|&s| s == 0.0));
        }
    }

    #[test]
    fn sweep_advances_once_per_callback() {
        let mut phaser = Phaser::new(PhaserParams::four_stage(), 8).unwrap();
        let (mut l, mut r) = ([0.0; 8], [0.0; 8]);
        for _ in 0..3 {
            phaser.process(&ctx(8), &[0.0; 8], &mut l, &mut r);
        }
        assert!((phaser.sweep().angle() - 0.03).abs() < 1e-12);
    }

    /// Single-stage phaser against a sample-by-sample reference that carries
    /// filter memory across callbacks and feeds back the stage's own output
    /// from one callback earlier at the same position.
    #[test]
    fn single_stage_matches_reference_across_frames() {
        let params = PhaserParams {
            resonance: vec![0.9],
            base_frequencies: vec![300.0],
            ..PhaserParams::default()
        };
        let frames = 5;
        let len = 6;
        let mut phaser = Phaser::new(params.clone(), len).unwrap();
        let mut sweep = Sweep::new(params.sweep);

        let (mut xm1, mut xm2, mut ym1, mut ym2) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
        let mut prev_frame_y = vec![0.0f32; len];

        for frame in 0..frames {
            let input: Vec<f32> = (0..len).map(|i| ((frame * len + i) as f32 * 0.37).sin() * 0.5).collect();
            let (mut l, mut r) = (vec![0.0; len], vec![0.0; len]);
            phaser.process(&ctx(len), &input, &mut l, &mut r);
            assert_eq!(l, r);

            let (a1, a2) = all_pass_coefficients(0.9, 300.0, sweep.scale(), SAMPLE_RATE);
            for i in 0..len {
                let x = input[i] + 0.7 * prev_frame_y[i];
                let y = a2 * x + a1 * xm1 + xm2 - a1 * ym1 - a2 * ym2;
                xm2 = xm1;
                xm1 = x;
                ym2 = ym1;
                ym1 = y;
                prev_frame_y[i] = y;

                let expected = 1.0 * y - 1.1 * input[i];
                assert!(
                    (l[i] - expected).abs() < 1e-5,
                    "frame {} sample {}: got {}, want {}",
                    frame,
                    i,
                    l[i],
                    expected
                );
            }
            sweep.advance();
        }
    }

    #[test]
    fn reset_restores_initial_output() {
        let mut phaser = Phaser::new(PhaserParams::eight_stage(), 16).unwrap();
        let input: Vec<f32> = (0..16).map(|i| (i as f32 * 0.2).sin()).collect();

        let (mut first, mut r) = (vec![0.0; 16], vec![0.0; 16]);
        phaser.process(&ctx(16), &input, &mut first, &mut r);
        for _ in 0..10 {
            let (mut l, mut r) = (vec![0.0; 16], vec![0.0; 16]);
            phaser.process(&ctx(16), &input, &mut l, &mut r);
        }

        phaser.reset();
        let (mut again, mut r) = (vec![0.0; 16], vec![0.0; 16]);
        phaser.process(&ctx(16), &input, &mut again, &mut r);

        assert_eq!(first, again);
    }
}
