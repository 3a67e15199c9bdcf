//! Core effect trait and context types.

use crate::effects::{Delay, Flanger, PassThrough, Phaser, Reverb};

/// Information available during audio processing.
///
/// Passed to every [`Effect::process`] call. Fixed for the lifetime of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcessContext {
    /// Sample rate in Hz (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of samples per callback frame (e.g., 128)
    pub buffer_size: usize,
}

/// A per-callback audio transform from one mono input frame to a stereo frame.
///
/// Implementations own all of their state (history rings, filter memory,
/// sweep position). Everything is allocated when the effect is built, so
/// `process` must not allocate, lock, block or log: it runs on the audio
/// device's real-time thread, once per buffer period.
///
/// # Frame contract
///
/// `input`, `left` and `right` have the same length, at most
/// [`ProcessContext::buffer_size`]. Each sample position of `left` and `right`
/// must be written.
///
/// ```
/// use effektor::{Effect, ProcessContext};
///
/// /// Flips the polarity of the input.
/// struct Invert;
///
/// impl Effect for Invert {
///     fn process(
///         &mut self,
///         _ctx: &ProcessContext,
///         input: &[f32],
///         left: &mut [f32],
///         right: &mut [f32],
///     ) {
///         for ((&x, l), r) in input.iter().zip(left.iter_mut()).zip(right.iter_mut()) {
///             *l = -x;
///             *r = -x;
///         }
///     }
/// }
///
/// let ctx = ProcessContext { sample_rate: 44100, buffer_size: 2 };
/// let (mut l, mut r) = ([0.0; 2], [0.0; 2]);
/// Invert.process(&ctx, &[0.5, -0.25], &mut l, &mut r);
/// assert_eq!(l, [-0.5, 0.25]);
/// ```
pub trait Effect: Send + 'static {
    /// Process one frame.
    fn process(&mut self, ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]);

    /// Return to the freshly-built state (silent history, initial sweep).
    fn reset(&mut self) {}
}

/// Which effect the engine runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Input copied to both outputs.
    #[default]
    None,
    /// Feedback comb delay.
    Delay,
    /// Short modulated delay.
    Flanger,
    /// Swept all-pass cascade.
    Phaser,
    /// Comb filter reverb.
    Reverb,
}

impl EffectKind {
    pub const ALL: [EffectKind; 5] = [
        EffectKind::None,
        EffectKind::Delay,
        EffectKind::Flanger,
        EffectKind::Phaser,
        EffectKind::Reverb,
    ];

    /// Pick an effect from a menu key, `1` = delay through `4` = reverb.
    /// Any other key means no effect.
    pub fn from_menu_key(key: char) -> Self {
        match key {
            '1' => EffectKind::Delay,
            '2' => EffectKind::Flanger,
            '3' => EffectKind::Phaser,
            '4' => EffectKind::Reverb,
            _ => EffectKind::None,
        }
    }

    /// Inverse of [`from_menu_key`](Self::from_menu_key); `0` for no effect.
    pub fn menu_key(self) -> char {
        match self {
            EffectKind::None => '0',
            EffectKind::Delay => '1',
            EffectKind::Flanger => '2',
            EffectKind::Phaser => '3',
            EffectKind::Reverb => '4',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::None => "none",
            EffectKind::Delay => "delay",
            EffectKind::Flanger => "flanger",
            EffectKind::Phaser => "phaser",
            EffectKind::Reverb => "reverb",
        }
    }
}

impl core::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for EffectKind {
    type Err = UnknownEffect;

    /// Accepts effect names (case-insensitive) and the menu keys `0`-`4`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(key), None) = (chars.next(), chars.next()) {
            if key.is_ascii_digit() {
                return Ok(Self::from_menu_key(key));
            }
        }
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEffect(s.to_owned()))
    }
}

/// Returned when parsing an unrecognised effect name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEffect(pub String);

impl core::fmt::Display for UnknownEffect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown effect `{}`", self.0)
    }
}

impl std::error::Error for UnknownEffect {}

/// The configured effect, dispatched by variant.
///
/// Built once from an [`EngineConfig`](crate::EngineConfig); the engine never
/// changes variant while streaming.
pub enum EffectProcessor {
    PassThrough(PassThrough),
    Delay(Delay),
    Flanger(Flanger),
    Phaser(Phaser),
    Reverb(Reverb),
}

impl EffectProcessor {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectProcessor::PassThrough(_) => EffectKind::None,
            EffectProcessor::Delay(_) => EffectKind::Delay,
            EffectProcessor::Flanger(_) => EffectKind::Flanger,
            EffectProcessor::Phaser(_) => EffectKind::Phaser,
            EffectProcessor::Reverb(_) => EffectKind::Reverb,
        }
    }
}

impl Effect for EffectProcessor {
    fn process(&mut self, ctx: &ProcessContext, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        match self {
            EffectProcessor::PassThrough(e) => e.process(ctx, input, left, right),
            EffectProcessor::Delay(e) => e.process(ctx, input, left, right),
            EffectProcessor::Flanger(e) => e.process(ctx, input, left, right),
            EffectProcessor::Phaser(e) => e.process(ctx, input, left, right),
            EffectProcessor::Reverb(e) => e.process(ctx, input, left, right),
        }
    }

    fn reset(&mut self) {
        match self {
            EffectProcessor::PassThrough(e) => e.reset(),
            EffectProcessor::Delay(e) => e.reset(),
            EffectProcessor::Flanger(e) => e.reset(),
            EffectProcessor::Phaser(e) => e.reset(),
            EffectProcessor::Reverb(e) => e.reset(),
        }
    }
}
