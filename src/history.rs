//! Circular sample store.
//!
//! A [`HistoryRing`] keeps the last `depth` frames ("generations") of a signal,
//! one slot per sample position within the buffer. Effects that need to look
//! back a whole number of callbacks read through it instead of doing their own
//! index arithmetic.
//!
//! ```
//! use effektor::HistoryRing;
//!
//! let mut ring = HistoryRing::new(4, 8);
//! ring.advance();
//! ring.write(0, 1.0);
//! ring.advance();
//! ring.write(0, 0.5);
//!
//! assert_eq!(ring.read_past(0, 0), 0.5);
//! assert_eq!(ring.read_past(0, 1), 1.0);
//! ```

/// A fixed-depth, multi-position ring of past frames.
///
/// Storage is allocated once in [`new`](Self::new). Nothing here allocates
/// afterwards, so it is safe to drive from the audio callback.
#[derive(Clone, Debug)]
pub struct HistoryRing {
    /// `depth` generations of `positions` samples, generation-major.
    samples: Vec<f32>,
    positions: usize,
    depth: usize,
    /// Ring slot of the current generation.
    slot: usize,
}

impl HistoryRing {
    /// Create a silent ring for `positions` samples per frame and `depth` generations.
    pub fn new(positions: usize, depth: usize) -> Self {
        assert!(depth > 0, "history ring needs at least one generation");
        Self {
            samples: vec![0.0; positions * depth],
            positions,
            depth,
            slot: 0,
        }
    }

    /// Move to the next generation, wrapping at `depth`.
    ///
    /// Call exactly once per callback, before any [`write`](Self::write).
    #[inline]
    pub fn advance(&mut self) {
        self.slot += 1;
        if self.slot >= self.depth {
            self.slot = 0;
        }
    }

    /// Store `value` at `position` in the current generation.
    #[inline]
    pub fn write(&mut self, position: usize, value: f32) {
        let index = self.index(self.slot, position);
        self.samples[index] = value;
    }

    /// Read the sample written at `position` `delay` generations ago.
    ///
    /// `delay == 0` reads the current generation.
    #[inline]
    pub fn read_past(&self, position: usize, delay: usize) -> f32 {
        debug_assert!(delay < self.depth, "delay {} >= depth {}", delay, self.depth);
        let slot = (self.slot + self.depth - delay) % self.depth;
        self.samples[self.index(slot, position)]
    }

    /// Ring slot of the current generation, in `0..depth`.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn positions(&self) -> usize {
        self.positions
    }

    /// Silence all history and rewind to slot 0.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.slot = 0;
    }

    #[inline]
    fn index(&self, slot: usize, position: usize) -> usize {
        debug_assert!(position < self.positions);
        slot * self.positions + position
    }
}
