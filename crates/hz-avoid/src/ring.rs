//! `ReactionRingBuffer` — fixed-capacity history of immediate sensor
//! responses, read back `k` ticks late to simulate reaction time.

use hz_core::{EntityId, Tick, Vec3};
use tracing::trace;

use crate::AgentAvoidanceState;

/// One immediate response and the tick it was sensed on.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingEntry {
    pub adjustment:  Vec3,
    pub urgency:     f32,
    pub cause:       EntityId,
    pub sample_tick: Tick,
}

impl RingEntry {
    pub fn state(&self) -> AgentAvoidanceState {
        AgentAvoidanceState::new(self.adjustment, self.urgency, self.cause)
    }
}

/// Circular buffer with a monotonically increasing write cursor.
///
/// The slot for the `n`th push is `n % capacity`; once full, each push
/// overwrites the oldest entry.  A zero-capacity buffer accepts pushes and
/// never returns anything.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionRingBuffer {
    slots:    Vec<RingEntry>,
    capacity: usize,
    cursor:   u64,
}

impl ReactionRingBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { slots: Vec::with_capacity(capacity), capacity, cursor: 0 }
    }

    /// Sized for a delay of `delay_ticks`: the entry from `now - delay_ticks`
    /// is still held after pushing `now`.  Zero delay needs no buffer.
    pub fn for_delay(delay_ticks: u64) -> Self {
        if delay_ticks == 0 {
            Self::default()
        } else {
            Self::with_capacity(delay_ticks as usize + 2)
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total pushes since creation.
    #[inline]
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn push(&mut self, entry: RingEntry) {
        if self.capacity == 0 {
            return;
        }
        let slot = (self.cursor % self.capacity as u64) as usize;
        if slot < self.slots.len() {
            self.slots[slot] = entry;
        } else {
            self.slots.push(entry);
        }
        self.cursor += 1;
    }

    /// The entry with the largest `sample_tick <= target`, by linear scan.
    pub fn latest_at_or_before(&self, target: Tick) -> Option<RingEntry> {
        let found = self
            .slots
            .iter()
            .filter(|e| e.sample_tick <= target)
            .max_by_key(|e| e.sample_tick)
            .copied();
        trace!(target_tick = target.0, hit = found.is_some(), "ring lookup");
        found
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
    }
}
