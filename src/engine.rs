//! Real-time callback driver

use std::sync::Arc;

use tracing::info;

use crate::config::EngineConfig;
use crate::effect::{Effect, EffectKind, EffectProcessor, ProcessContext};
use crate::error::ConfigError;
use crate::sink::{ArchiveSink, ArchiveStats};

/// Runs the configured effect once per buffer period and archives the result.
///
/// All state is allocated in [`Engine::new`]; [`process`](Self::process) is
/// safe to call from an audio callback.
///
/// # Example
///
/// ```
/// use effektor::{archive_channel, EffectKind, Engine, EngineConfig};
///
/// let config = EngineConfig::default().with_effect(EffectKind::Reverb);
/// let (sink, mut source) = archive_channel(config.buffer_size, 16);
/// let mut engine = Engine::new(&config)?.with_archive(sink);
///
/// let input = vec![0.25; config.buffer_size];
/// let mut left = vec![0.0; config.buffer_size];
/// let mut right = vec![0.0; config.buffer_size];
/// engine.process(&input, &mut left, &mut right);
///
/// assert_eq!(source.pending(), 2 * config.buffer_size);
/// # Ok::<(), effektor::ConfigError>(())
/// ```
pub struct Engine {
    ctx: ProcessContext,
    effect: EffectProcessor,
    archive: Option<ArchiveSink>,
    /// Scratch output for [`process_input`](Self::process_input)
    left: Vec<f32>,
    right: Vec<f32>,
    generations: u64,
}

impl Engine {
    /// Validate `config` and build the selected effect.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        let effect = config.build_effect()?;
        info!(
            effect = %effect.kind(),
            sample_rate = config.sample_rate,
            buffer_size = config.buffer_size,
            history_depth = config.history_depth,
            "engine ready"
        );

        Ok(Self {
            ctx: config.context(),
            effect,
            archive: None,
            left: vec![0.0; config.buffer_size],
            right: vec![0.0; config.buffer_size],
            generations: 0,
        })
    }

    /// Forward every processed frame to `sink` (builder pattern).
    pub fn with_archive(mut self, sink: ArchiveSink) -> Self {
        self.archive = Some(sink);
        self
    }

    #[inline]
    pub fn context(&self) -> ProcessContext {
        self.ctx
    }

    #[inline]
    pub fn effect_kind(&self) -> EffectKind {
        self.effect.kind()
    }

    /// Callbacks processed since construction or the last [`reset`](Self::reset).
    #[inline]
    pub fn generations(&self) -> u64 {
        self.generations
    }

    /// Counters of the attached archive, if any.
    pub fn archive_stats(&self) -> Option<Arc<ArchiveStats>> {
        self.archive.as_ref().map(ArchiveSink::stats)
    }

    /// Process one callback's frame.
    ///
    /// The frame is the shortest of the three slices, capped at the configured
    /// buffer size; samples past it are left untouched.
    pub fn process(&mut self, input: &[f32], left: &mut [f32], right: &mut [f32]) {
        Self::run(
            &self.ctx,
            &mut self.effect,
            self.archive.as_mut(),
            input,
            left,
            right,
        );
        self.generations += 1;
    }

    /// Process one frame into the engine's own output buffers and return them.
    pub fn process_input(&mut self, input: &[f32]) -> (&[f32], &[f32]) {
        let n = Self::run(
            &self.ctx,
            &mut self.effect,
            self.archive.as_mut(),
            input,
            &mut self.left,
            &mut self.right,
        );
        self.generations += 1;
        (&self.left[..n], &self.right[..n])
    }

    /// Silence effect history and restart the generation count.
    ///
    /// Not for use while streaming.
    pub fn reset(&mut self) {
        self.effect.reset();
        self.generations = 0;
    }

    fn run(
        ctx: &ProcessContext,
        effect: &mut EffectProcessor,
        archive: Option<&mut ArchiveSink>,
        input: &[f32],
        left: &mut [f32],
        right: &mut [f32],
    ) -> usize {
        let n = input.len().min(left.len()).min(right.len()).min(ctx.buffer_size);
        let (left, right) = (&mut left[..n], &mut right[..n]);

        effect.process(ctx, &input[..n], left, right);

        if let Some(sink) = archive {
            sink.push_frame(left, right);
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::archive_channel;

    #[test]
    fn pass_through_by_default() {
        let mut engine = Engine::new(&EngineConfig::default().with_buffer_size(4)).unwrap();
        let (l, r) = engine.process_input(&[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(l, &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(r, &[0.1, 0.2, 0.3, 0.4]);
        assert_eq!(engine.generations(), 1);
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig::default().with_buffer_size(0);
        assert_eq!(Engine::new(&config).err(), Some(ConfigError::ZeroBufferSize));
    }

    #[test]
    fn oversized_frames_are_truncated() {
        let mut engine = Engine::new(&EngineConfig::default().with_buffer_size(2)).unwrap();
        let mut left = [9.0; 3];
        let mut right = [9.0; 3];
        engine.process(&[0.5, 0.5, 0.5], &mut left, &mut right);
        assert_eq!(left, [0.5, 0.5, 9.0]);
        assert_eq!(right, [0.5, 0.5, 9.0]);
    }

    #[test]
    fn archives_every_frame() {
        let config = EngineConfig::default().with_buffer_size(8);
        let (sink, source) = archive_channel(8, 4);
        let mut engine = Engine::new(&config).unwrap().with_archive(sink);

        engine.process_input(&[0.0; 8]);
        engine.process_input(&[0.0; 8]);

        assert_eq!(source.pending(), 32);
        assert_eq!(engine.archive_stats().map(|s| s.frames()), Some(2));
    }

    #[test]
    fn reset_restarts_generations() {
        let config = EngineConfig::default().with_effect(EffectKind::Delay).with_buffer_size(4);
        let mut engine = Engine::new(&config).unwrap();
        engine.process_input(&[1.0; 4]);
        engine.reset();
        assert_eq!(engine.generations(), 0);
        assert_eq!(engine.effect_kind(), EffectKind::Delay);
    }
}
