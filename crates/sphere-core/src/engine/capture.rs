//! Fixed-capacity capture queue
//!
//! Holds the live input samples seen since the last poll. Storage is
//! allocated once with room for one poll window; a push past capacity is
//! dropped and counted rather than growing the allocation.

use crate::types::Sample;

#[derive(Debug, Clone)]
pub struct CaptureQueue {
    samples: Vec<Sample>,
    capacity: usize,
    dropped: u64,
}

impl CaptureQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append a sample; returns false (and counts a drop) when full
    #[inline]
    pub fn push(&mut self, sample: Sample) -> bool {
        if self.samples.len() >= self.capacity {
            self.dropped += 1;
            return false;
        }
        self.samples.push(sample);
        true
    }

    /// Empty the queue without releasing storage
    #[inline]
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pushes rejected since construction
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    /// Source sample for output index `i` when stretching the queue to `target_len`
    ///
    /// Linear index mapping with integer floor: `i * len / target_len`.
    /// Returns `None` for an empty queue or a zero target.
    #[inline]
    pub fn sample_for(&self, i: usize, target_len: usize) -> Option<Sample> {
        if self.samples.is_empty() || target_len == 0 {
            return None;
        }
        let src = (i as u64 * self.samples.len() as u64 / target_len as u64) as usize;
        self.samples.get(src.min(self.samples.len() - 1)).copied()
    }
}
