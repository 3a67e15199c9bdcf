//! effektor - real-time guitar effects over recursive history rings
//!
//! Design principles:
//! - One mono input frame in, one stereo frame out, once per callback
//! - Effects own all their state, allocated before the stream starts
//! - No locks, allocation or logging on the audio thread
//! - Processed audio is archived through a lock-free ring to a writer thread
//! - Configuration errors surface before any audio flows
//!
//! # Example
//!
//! ```
//! use effektor::{archive_channel, EffectKind, Engine, EngineConfig};
//!
//! let config = EngineConfig::default()
//!     .with_effect(EffectKind::Phaser)
//!     .with_buffer_size(64);
//!
//! let (sink, _source) = archive_channel(config.buffer_size, 32);
//! let mut engine = Engine::new(&config)?.with_archive(sink);
//!
//! let (left, right) = engine.process_input(&[0.1; 64]);
//! assert_eq!(left, right);
//! # Ok::<(), effektor::ConfigError>(())
//! ```

mod config;
mod effect;
pub mod effects;
mod engine;
mod error;
mod history;
pub mod sink;

#[cfg(feature = "cpal_io")]
mod device;
#[cfg(feature = "cpal_io")]
mod stream;

pub use config::EngineConfig;
pub use effect::{Effect, EffectKind, EffectProcessor, ProcessContext, UnknownEffect};
pub use engine::Engine;
pub use error::{ArchiveError, ConfigError};
pub use history::HistoryRing;
pub use sink::{archive_channel, ArchiveSink, ArchiveSource, ArchiveStats, WavArchiver};

#[cfg(feature = "cpal_io")]
pub use device::{CpalDevice, Direction};
#[cfg(feature = "cpal_io")]
pub use error::StreamError;
#[cfg(feature = "cpal_io")]
pub use stream::{LiveOptions, LiveStream, StreamStatus};
