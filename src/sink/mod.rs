//! Archival sinks.
//!
//! - [`ArchiveSink`] - Callback side, pushes 16-bit PCM into a ring buffer
//! - [`ArchiveSource`] - Writer side, drains the ring
//! - [`WavArchiver`] - Thread that drains an [`ArchiveSource`] into a WAV file

mod archive;
mod wav;

pub use archive::{archive_channel, sample_to_i16, ArchiveSink, ArchiveSource, ArchiveStats};
pub use wav::WavArchiver;
