//! Scheduling interface
//!
//! [`Schedule`] is implemented twice: by [`TimerMux`](super::TimerMux) for
//! foreground code, and by [`Timers`] for callbacks running inside the
//! compare-match interrupt.

use super::callback::{Callback, Handler};
use super::control::DelayControl;
use super::scale::TickScale;
use super::slot::{self, Slot};
use super::MuxError;
use crate::chrono::Milliseconds;

/// Schedule and cancel delays
///
/// Durations must be non-zero and no longer than the configured
/// `max_duration`; longer ones saturate.
pub trait Schedule {
    /// Claim a free slot for `callback`, firing after `duration`
    fn try_schedule(
        &mut self,
        duration: Milliseconds,
        recurring: bool,
        callback: Callback,
    ) -> Result<DelayControl, MuxError>;

    /// Cancel the delay behind `handle` and clear the handle
    ///
    /// The hardware deadline is left alone; the next compare match simply
    /// finds the slot empty. Stale and empty handles are ignored.
    fn cancel(&mut self, handle: &mut DelayControl);

    /// Check whether `handle` still refers to a pending delay
    fn is_active(&self, handle: &DelayControl) -> bool;

    /// Like [`try_schedule`](Self::try_schedule), but running out of slots is fatal
    ///
    /// # Panics
    /// When every slot is in use. Slot capacity is a design-time budget;
    /// silently dropping a delay could leave hardware in a bad state.
    fn schedule(&mut self, duration: Milliseconds, recurring: bool, callback: Callback) -> DelayControl {
        match self.try_schedule(duration, recurring, callback) {
            Ok(handle) => handle,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::error!("timer mux: no free delay slot");
                panic!("timer mux: no free delay slot")
            }
        }
    }

    /// Call `f` once, after `duration`
    fn once(&mut self, duration: Milliseconds, f: fn(&mut Timers<'_>)) -> DelayControl {
        self.schedule(duration, false, Callback::Fn(f))
    }

    /// Call `f` every `period`
    fn repeat(&mut self, period: Milliseconds, f: fn(&mut Timers<'_>)) -> DelayControl {
        self.schedule(period, true, Callback::Fn(f))
    }

    /// Fire `handler` once, after `duration`
    fn once_handler(&mut self, duration: Milliseconds, handler: &'static dyn Handler) -> DelayControl {
        self.schedule(duration, false, Callback::Handler(handler))
    }

    /// Fire `handler` every `period`
    fn repeat_handler(&mut self, period: Milliseconds, handler: &'static dyn Handler) -> DelayControl {
        self.schedule(period, true, Callback::Handler(handler))
    }
}

/// Scheduling context handed to callbacks
///
/// The interrupt scan in progress owns the hardware, so delays scheduled
/// here only touch the slot table: they count from the counter reset that
/// ends the current interrupt, and the scan skips them.
pub struct Timers<'a> {
    slots: &'a mut [Slot],
    scale: &'a TickScale,
}

impl<'a> Timers<'a> {
    pub(crate) fn new(slots: &'a mut [Slot], scale: &'a TickScale) -> Self {
        Self { slots, scale }
    }

    /// Ticks left on a pending delay
    pub fn remaining_ticks(&self, handle: &DelayControl) -> Option<u16> {
        slot::remaining_ticks(self.slots, handle)
    }

    pub fn scale(&self) -> &TickScale {
        self.scale
    }
}

impl Schedule for Timers<'_> {
    fn try_schedule(
        &mut self,
        duration: Milliseconds,
        recurring: bool,
        callback: Callback,
    ) -> Result<DelayControl, MuxError> {
        let ticks = self.scale.ticks(duration);
        slot::claim(self.slots, ticks, recurring, callback, true)
    }

    fn cancel(&mut self, handle: &mut DelayControl) {
        slot::cancel(self.slots, handle);
    }

    fn is_active(&self, handle: &DelayControl) -> bool {
        slot::is_active(self.slots, handle)
    }
}
