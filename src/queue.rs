//! Bounded ring buffer of pending stream steps.
//!
//! The radio transport beneath the stream has no windowing of its own, so the
//! producer learns how much it may send from [`StreamQueue::free_space`]. One
//! slot is always kept empty to tell a full queue from an empty one.

use crate::time::TimeDuration;
use crate::types::EffectStep;

/// Fixed-capacity FIFO of stream steps.
///
/// # Type Parameters
/// * `D` - The duration type of the queued steps
/// * `C` - Number of slots; at most `C - 1` are occupied at once
#[derive(Debug, Clone)]
pub struct StreamQueue<D: TimeDuration, const C: usize> {
    slots: [Option<EffectStep<D>>; C],
    read: usize,
    write: usize,
}

impl<D: TimeDuration, const C: usize> StreamQueue<D, C> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        const { assert!(C >= 2, "stream queue needs at least two slots") };

        Self {
            slots: core::array::from_fn(|_| None),
            read: 0,
            write: 0,
        }
    }

    /// Appends a step unless the queue is full.
    ///
    /// Returns `false` and leaves the queue untouched when full; the caller
    /// drops the incoming step.
    #[must_use]
    pub fn try_enqueue(&mut self, step: EffectStep<D>) -> bool {
        if self.is_full() {
            return false;
        }

        self.slots[self.write] = Some(step);
        self.write = (self.write + 1) % C;
        true
    }

    /// Removes and returns the oldest step, if any.
    pub fn try_dequeue(&mut self) -> Option<EffectStep<D>> {
        if self.is_empty() {
            return None;
        }

        let step = self.slots[self.read].take();
        self.read = (self.read + 1) % C;
        step
    }

    /// Number of steps the producer may still send.
    pub fn free_space(&self) -> u32 {
        (self.capacity() - self.occupied()) as u32
    }

    /// Number of queued steps.
    pub fn occupied(&self) -> usize {
        (self.write + C - self.read) % C
    }

    /// Usable capacity, one less than the slot count.
    pub fn capacity(&self) -> usize {
        C - 1
    }

    /// Returns true if no step is queued.
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    /// Returns true if the next enqueue would be dropped.
    pub fn is_full(&self) -> bool {
        self.occupied() == self.capacity()
    }

    /// Discards every queued step.
    pub fn clear(&mut self) {
        while self.try_dequeue().is_some() {}
        self.read = 0;
        self.write = 0;
    }
}

impl<D: TimeDuration, const C: usize> Default for StreamQueue<D, C> {
    fn default() -> Self {
        Self::new()
    }
}
