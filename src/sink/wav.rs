//! WAV archival writer thread

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{info, warn};

use super::archive::{ArchiveSource, ArchiveStats};
use crate::error::ArchiveError;

/// How long the writer sleeps when the ring is empty.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Drains an [`ArchiveSource`] into a 16-bit stereo WAV file on its own thread.
///
/// The file is created in [`spawn`](Self::spawn), so a bad path is reported
/// before any audio flows. Call [`finish`](Self::finish) after the stream has
/// stopped to flush everything left in the ring and finalize the header.
pub struct WavArchiver {
    path: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<usize, ArchiveError>>>,
    source_stats: Arc<ArchiveStats>,
}

impl WavArchiver {
    pub fn spawn<P: AsRef<Path>>(
        path: P,
        sample_rate: u32,
        mut source: ArchiveSource,
    ) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)?;
        info!(path = %path.display(), sample_rate, "archiving to wav");

        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let source_stats = source.stats();

        let handle = thread::Builder::new()
            .name("effektor-archive".into())
            .spawn(move || -> Result<usize, ArchiveError> {
                let mut written = 0;
                loop {
                    // read the flag first so nothing pushed before stop is missed
                    let stopping = stop_flag.load(Ordering::Acquire);
                    let drained = source.drain(|s| write_sample(&mut writer, s))?;
                    written += drained;
                    if stopping {
                        break;
                    }
                    if drained == 0 {
                        thread::sleep(POLL_INTERVAL);
                    }
                }
                writer.finalize()?;
                Ok(written)
            })
            .map_err(ArchiveError::Spawn)?;

        Ok(Self {
            path,
            stop,
            handle: Some(handle),
            source_stats,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop the writer, flush what is queued, and finalize the file.
    ///
    /// Returns the number of samples (both channels) written.
    pub fn finish(mut self) -> Result<usize, ArchiveError> {
        let written = self.join()?;

        let stats = &self.source_stats;
        info!(path = %self.path.display(), samples = written, "wav archive finalized");
        if stats.clipped_samples() > 0 {
            warn!(clipped = stats.clipped_samples(), "archived samples were clamped to full scale");
        }
        if stats.dropped_frames() > 0 {
            warn!(dropped = stats.dropped_frames(), "archive writer fell behind, frames dropped");
        }
        Ok(written)
    }

    fn join(&mut self) -> Result<usize, ArchiveError> {
        self.stop.store(true, Ordering::Release);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ArchiveError::WriterPanicked)?,
            None => Ok(0),
        }
    }
}

impl Drop for WavArchiver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(err) = self.join() {
                warn!(%err, "wav archive dropped without finishing cleanly");
            }
        }
    }
}

fn write_sample(writer: &mut hound::WavWriter<BufWriter<File>>, sample: i16) -> Result<(), ArchiveError> {
    writer.write_sample(sample)?;
    Ok(())
}
