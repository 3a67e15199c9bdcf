//! Error types.
//!
//! Everything that can go wrong is caught before the stream starts. Once the
//! callback is running the effect path has no failure modes of its own; clipping
//! and archive overruns are counted in [`ArchiveStats`](crate::sink::ArchiveStats)
//! instead of being reported as errors.

use core::fmt;

/// An invalid engine or effect configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// The sample rate was zero.
    ZeroSampleRate,
    /// The buffer size was zero.
    ZeroBufferSize,
    /// The history ring must hold at least two generations.
    HistoryTooShallow { depth: usize },
    /// A delay length of zero generations reads the slot being written.
    ZeroDelay { effect: &'static str },
    /// A delay reaches at or past the end of the history ring.
    DelayExceedsHistory {
        effect: &'static str,
        delay: usize,
        depth: usize,
    },
    /// The phaser needs at least one all-pass stage.
    NoPhaserStages,
    /// Per-stage resonance and base frequency tables differ in length.
    StageCountMismatch { resonances: usize, frequencies: usize },
    /// A pole radius outside (0, 1) makes the all-pass stage unstable.
    UnstableResonance { stage: usize, value: f64 },
    /// Base frequencies must be positive.
    InvalidFrequency { stage: usize, value: f64 },
    /// The sweep needs `lower < upper` and a positive step.
    InvalidSweep { lower: f64, upper: f64, step: f64 },
    /// A gain or mix amount is not a finite number.
    NonFiniteParameter { effect: &'static str, name: &'static str },
    /// A flanger delay range that is empty or out of order.
    InvalidFlangerDelay { base_ms: f32, max_ms: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSampleRate => write!(f, "sample rate must be non-zero"),
            ConfigError::ZeroBufferSize => write!(f, "buffer size must be non-zero"),
            ConfigError::HistoryTooShallow { depth } => {
                write!(f, "history depth {} is too shallow (need at least 2)", depth)
            }
            ConfigError::ZeroDelay { effect } => {
                write!(f, "{} delay length must be at least one generation", effect)
            }
            ConfigError::DelayExceedsHistory { effect, delay, depth } => write!(
                f,
                "{} delay of {} generations does not fit in a history of depth {}",
                effect, delay, depth
            ),
            ConfigError::NoPhaserStages => write!(f, "phaser needs at least one stage"),
            ConfigError::StageCountMismatch { resonances, frequencies } => write!(
                f,
                "phaser has {} resonance values but {} base frequencies",
                resonances, frequencies
            ),
            ConfigError::UnstableResonance { stage, value } => write!(
                f,
                "phaser stage {} resonance {} is outside (0, 1)",
                stage, value
            ),
            ConfigError::InvalidFrequency { stage, value } => write!(
                f,
                "phaser stage {} base frequency {} must be positive",
                stage, value
            ),
            ConfigError::InvalidSweep { lower, upper, step } => write!(
                f,
                "sweep bounds {}..{} with step {} are invalid",
                lower, upper, step
            ),
            ConfigError::NonFiniteParameter { effect, name } => {
                write!(f, "{} parameter `{}` is not finite", effect, name)
            }
            ConfigError::InvalidFlangerDelay { base_ms, max_ms } => write!(
                f,
                "flanger delay range {}ms..{}ms is invalid",
                base_ms, max_ms
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A failure of the archival writer.
#[derive(Debug)]
pub enum ArchiveError {
    /// Creating, writing or finalizing the WAV file failed.
    Wav(hound::Error),
    /// The writer thread could not be started.
    Spawn(std::io::Error),
    /// The writer thread panicked.
    WriterPanicked,
}

impl fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveError::Wav(err) => write!(f, "wav archive error: {}", err),
            ArchiveError::Spawn(err) => write!(f, "failed to start archive writer: {}", err),
            ArchiveError::WriterPanicked => write!(f, "archive writer thread panicked"),
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Wav(err) => Some(err),
            ArchiveError::Spawn(err) => Some(err),
            ArchiveError::WriterPanicked => None,
        }
    }
}

impl From<hound::Error> for ArchiveError {
    fn from(err: hound::Error) -> Self {
        ArchiveError::Wav(err)
    }
}

/// A failure while opening or running the live audio streams.
#[cfg(feature = "cpal_io")]
#[derive(Debug)]
pub enum StreamError {
    /// No input or output device was available.
    NoDevice(&'static str),
    /// The device's default config could not be read.
    DefaultConfig(cpal::DefaultStreamConfigError),
    /// The device uses a sample format this crate does not handle.
    UnsupportedFormat(cpal::SampleFormat),
    /// Input and output devices run at different rates.
    SampleRateMismatch { input: u32, output: u32 },
    /// The engine was configured for a different rate than the devices run at.
    EngineRateMismatch { engine: u32, device: u32 },
    /// Building a stream failed.
    Build(cpal::BuildStreamError),
    /// Starting a stream failed.
    Play(cpal::PlayStreamError),
}

#[cfg(feature = "cpal_io")]
impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::NoDevice(kind) => write!(f, "no {} device available", kind),
            StreamError::DefaultConfig(err) => write!(f, "no default stream config: {}", err),
            StreamError::UnsupportedFormat(fmt) => {
                write!(f, "unsupported sample format: {:?}", fmt)
            }
            StreamError::SampleRateMismatch { input, output } => write!(
                f,
                "input runs at {} Hz but output runs at {} Hz",
                input, output
            ),
            StreamError::EngineRateMismatch { engine, device } => write!(
                f,
                "engine is configured for {} Hz but the devices run at {} Hz",
                engine, device
            ),
            StreamError::Build(err) => write!(f, "failed to build stream: {}", err),
            StreamError::Play(err) => write!(f, "failed to start stream: {}", err),
        }
    }
}

#[cfg(feature = "cpal_io")]
impl std::error::Error for StreamError {}

#[cfg(feature = "cpal_io")]
impl From<cpal::BuildStreamError> for StreamError {
    fn from(err: cpal::BuildStreamError) -> Self {
        StreamError::Build(err)
    }
}

#[cfg(feature = "cpal_io")]
impl From<cpal::PlayStreamError> for StreamError {
    fn from(err: cpal::PlayStreamError) -> Self {
        StreamError::Play(err)
    }
}

#[cfg(feature = "cpal_io")]
impl From<cpal::DefaultStreamConfigError> for StreamError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        StreamError::DefaultConfig(err)
    }
}
