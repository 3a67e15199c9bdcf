//! Real-time side of the archival path.
//!
//! The callback converts each processed stereo frame to 16-bit PCM and pushes
//! it into an rtrb ring buffer. A writer on another thread drains the ring.
//! Nothing on the callback side blocks: when the ring is full the frame is
//! dropped and counted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

/// Counters shared between the callback and whoever monitors the archive.
#[derive(Debug, Default)]
pub struct ArchiveStats {
    frames: AtomicUsize,
    dropped_frames: AtomicUsize,
    clipped_samples: AtomicUsize,
}

impl ArchiveStats {
    /// Frames pushed into the ring.
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::Relaxed)
    }

    /// Frames discarded because the writer fell behind.
    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Samples that were outside [-1, 1] and got clamped.
    pub fn clipped_samples(&self) -> usize {
        self.clipped_samples.load(Ordering::Relaxed)
    }
}

/// Convert a normalized sample to 16-bit PCM, clamping to [-1, 1].
///
/// Returns the PCM value and whether the input had to be clamped.
#[inline]
pub fn sample_to_i16(sample: f32) -> (i16, bool) {
    // NaN clamps to itself; treat it as clipped silence
    if sample.is_nan() {
        return (0, true);
    }
    let clamped = sample.clamp(-1.0, 1.0);
    ((clamped * i16::MAX as f32) as i16, clamped != sample)
}

/// Create a connected sink/source pair able to hold `capacity_frames`
/// stereo frames of `buffer_size` samples.
pub fn archive_channel(buffer_size: usize, capacity_frames: usize) -> (ArchiveSink, ArchiveSource) {
    let capacity = buffer_size.max(1) * 2 * capacity_frames.max(1);
    let (producer, consumer) = RingBuffer::<i16>::new(capacity);
    let stats = Arc::new(ArchiveStats::default());
    (
        ArchiveSink {
            producer,
            stats: stats.clone(),
        },
        ArchiveSource { consumer, stats },
    )
}

/// Callback side: pushes interleaved L/R PCM into the ring.
pub struct ArchiveSink {
    producer: Producer<i16>,
    stats: Arc<ArchiveStats>,
}

impl ArchiveSink {
    /// Archive one stereo frame.
    ///
    /// The frame is written whole or not at all.
    pub fn push_frame(&mut self, left: &[f32], right: &[f32]) {
        let len = left.len().min(right.len());
        if self.producer.slots() < len * 2 {
            self.stats.dropped_frames.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let mut clipped = 0;
        for (&l, &r) in left.iter().zip(right.iter()) {
            let (l, l_clipped) = sample_to_i16(l);
            let (r, r_clipped) = sample_to_i16(r);
            clipped += l_clipped as usize + r_clipped as usize;
            // slots checked above
            let _ = self.producer.push(l);
            let _ = self.producer.push(r);
        }

        if clipped > 0 {
            self.stats.clipped_samples.fetch_add(clipped, Ordering::Relaxed);
        }
        self.stats.frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns how many sample slots are free
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }

    pub fn stats(&self) -> Arc<ArchiveStats> {
        self.stats.clone()
    }
}

/// Writer side: drains archived PCM out of the ring.
pub struct ArchiveSource {
    consumer: Consumer<i16>,
    stats: Arc<ArchiveStats>,
}

impl ArchiveSource {
    /// Hand every sample currently queued to `write`, in order.
    ///
    /// Returns how many samples were drained. Stops early at the first error.
    pub fn drain<E>(&mut self, mut write: impl FnMut(i16) -> Result<(), E>) -> Result<usize, E> {
        let available = self.consumer.slots();
        if available == 0 {
            return Ok(0);
        }
        let chunk = match self.consumer.read_chunk(available) {
            Ok(chunk) => chunk,
            Err(_) => return Ok(0),
        };

        let (first, second) = chunk.as_slices();
        for &sample in first.iter().chain(second.iter()) {
            write(sample)?;
        }
        chunk.commit_all();
        Ok(available)
    }

    /// Samples waiting to be drained.
    #[inline]
    pub fn pending(&self) -> usize {
        self.consumer.slots()
    }

    pub fn stats(&self) -> Arc<ArchiveStats> {
        self.stats.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain_all(source: &mut ArchiveSource) -> Vec<i16> {
        let mut out = Vec::new();
        source
            .drain(|s| {
                out.push(s);
                Ok::<(), ()>(())
            })
            .unwrap();
        out
    }

    #[test]
    fn converts_full_scale() {
        assert_eq!(sample_to_i16(0.0), (0, false));
        assert_eq!(sample_to_i16(1.0), (i16::MAX, false));
        assert_eq!(sample_to_i16(-1.0), (-i16::MAX, false));
        assert_eq!(sample_to_i16(0.5), (16383, false));
    }

    #[test]
    fn clamps_and_flags_excursions() {
        assert_eq!(sample_to_i16(1.5), (i16::MAX, true));
        assert_eq!(sample_to_i16(-3.0), (-i16::MAX, true));
        assert_eq!(sample_to_i16(f32::NAN), (0, true));
    }

    #[test]
    fn frames_are_interleaved() {
        let (mut sink, mut source) = archive_channel(2, 4);
        sink.push_frame(&[1.0, 0.0], &[-1.0, 0.5]);

        assert_eq!(drain_all(&mut source), vec![i16::MAX, -i16::MAX, 0, 16383]);
        assert_eq!(source.stats().frames(), 1);
    }

    #[test]
    fn counts_clipped_samples() {
        let (mut sink, _source) = archive_channel(3, 4);
        sink.push_frame(&[2.0, 0.1, -1.2], &[2.0, 0.1, 0.3]);
        assert_eq!(sink.stats().clipped_samples(), 3);
    }

    #[test]
    fn full_ring_drops_whole_frames() {
        let (mut sink, mut source) = archive_channel(2, 1);
        sink.push_frame(&[0.1, 0.1], &[0.1, 0.1]);
        sink.push_frame(&[0.2, 0.2], &[0.2, 0.2]);

        let stats = sink.stats();
        assert_eq!(stats.frames(), 1);
        assert_eq!(stats.dropped_frames(), 1);
        assert_eq!(drain_all(&mut source).len(), 4);

        // room again once drained
        sink.push_frame(&[0.3, 0.3], &[0.3, 0.3]);
        assert_eq!(stats.frames(), 2);
    }

    #[test]
    fn drain_stops_at_first_error() {
        let (mut sink, mut source) = archive_channel(2, 2);
        sink.push_frame(&[0.0, 0.0], &[0.0, 0.0]);
        let result = source.drain(|_| Err("disk full"));
        assert_eq!(result, Err("disk full"));
    }
}
