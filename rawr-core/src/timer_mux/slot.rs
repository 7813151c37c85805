//! Slot table operations shared by foreground and interrupt scheduling

use super::callback::Callback;
use super::control::DelayControl;
use super::MuxError;

/// One virtual timer
#[derive(Debug, Clone, Copy)]
pub(crate) struct Slot {
    /// Ticks until the next firing, counted from the last counter reset
    pub(crate) remaining_ticks: u16,
    /// Reload value for recurring delays; 0 for one-shot
    pub(crate) initial_ticks: u16,
    /// `None` marks the slot free
    pub(crate) callback: Option<Callback>,
    /// Bumped on every claim, to detect stale handles
    pub(crate) generation: u8,
    /// Claimed during the interrupt scan in progress
    pub(crate) fresh: bool,
}

impl Slot {
    pub(crate) const EMPTY: Slot = Slot {
        remaining_ticks: 0,
        initial_ticks: 0,
        callback: None,
        generation: 0,
        fresh: false,
    };

    pub(crate) fn active(&self) -> bool {
        self.callback.is_some()
    }
}

/// Claim the first free slot, lowest index first
pub(crate) fn claim(
    slots: &mut [Slot],
    ticks: u16,
    recurring: bool,
    callback: Callback,
    fresh: bool,
) -> Result<DelayControl, MuxError> {
    let index = slots
        .iter()
        .position(|s| !s.active())
        .ok_or(MuxError::Exhausted)?;
    let slot = &mut slots[index];
    slot.remaining_ticks = ticks;
    slot.initial_ticks = if recurring { ticks } else { 0 };
    slot.callback = Some(callback);
    slot.generation = slot.generation.wrapping_add(1);
    slot.fresh = fresh;

    #[cfg(feature = "defmt")]
    defmt::trace!(
        "timer mux: slot {} claimed, {} ticks, recurring={}",
        index,
        ticks,
        recurring
    );

    Ok(DelayControl::new(index as u8, slot.generation))
}

/// Charge `elapsed` ticks to every active slot
pub(crate) fn elapse(slots: &mut [Slot], elapsed: u16) {
    for slot in slots.iter_mut().filter(|s| s.active()) {
        slot.remaining_ticks = slot.remaining_ticks.saturating_sub(elapsed);
    }
}

/// Soonest deadline among active slots, clamped to what the counter can hold
pub(crate) fn next_ticks(slots: &[Slot], max_ticks: u16) -> Option<u16> {
    slots
        .iter()
        .filter(|s| s.active())
        .map(|s| s.remaining_ticks.min(max_ticks))
        .min()
}

fn live<'a>(slots: &'a mut [Slot], handle: &DelayControl) -> Option<&'a mut Slot> {
    let id = handle.slot()?;
    slots
        .get_mut(id.index as usize)
        .filter(|s| s.active() && s.generation == id.generation)
}

pub(crate) fn cancel(slots: &mut [Slot], handle: &mut DelayControl) {
    let handle = handle.take();
    if let Some(slot) = live(slots, &handle) {
        // The next compare match finds nothing here and reclaims nothing.
        slot.callback = None;
    }
}

pub(crate) fn is_active(slots: &[Slot], handle: &DelayControl) -> bool {
    handle
        .slot()
        .and_then(|id| slots.get(id.index as usize).map(|s| (s, id)))
        .is_some_and(|(s, id)| s.active() && s.generation == id.generation)
}

pub(crate) fn remaining_ticks(slots: &[Slot], handle: &DelayControl) -> Option<u16> {
    handle
        .slot()
        .and_then(|id| slots.get(id.index as usize).map(|s| (s, id)))
        .filter(|(s, id)| s.active() && s.generation == id.generation)
        .map(|(s, _)| s.remaining_ticks)
}
