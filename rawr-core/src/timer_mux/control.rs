//! Delay cancellation handles

use super::schedule::Schedule;

/// Slot position plus the generation it was claimed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct SlotId {
    pub(crate) index: u8,
    pub(crate) generation: u8,
}

/// Handle to a scheduled delay
///
/// Returned by [`Schedule::once`] and friends. It does not keep the slot
/// alive: a one-shot delay releases its slot when it fires, and the slot
/// may then be claimed by an unrelated delay. The handle records the
/// slot's generation, so cancelling through a stale handle does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DelayControl {
    slot: Option<SlotId>,
}

impl DelayControl {
    /// Handle that refers to nothing
    pub const EMPTY: DelayControl = DelayControl { slot: None };

    pub(crate) const fn new(index: u8, generation: u8) -> Self {
        Self {
            slot: Some(SlotId { index, generation }),
        }
    }

    pub(crate) fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    /// Check whether the handle refers to a slot
    ///
    /// This does not mean the delay is still pending; use
    /// [`Schedule::is_active`] for that.
    pub fn is_set(&self) -> bool {
        self.slot.is_some()
    }

    /// Slot table index, if any
    pub fn index(&self) -> Option<usize> {
        self.slot.map(|s| s.index as usize)
    }

    /// Take the handle, leaving [`DelayControl::EMPTY`] behind
    pub fn take(&mut self) -> DelayControl {
        core::mem::take(self)
    }

    /// Cancel the delay and clear this handle
    ///
    /// Convenience for `timers.cancel(&mut handle)`.
    pub fn cancel<S: Schedule + ?Sized>(&mut self, timers: &mut S) {
        timers.cancel(self);
    }
}
