//! Timer multiplexer
//!
//! Foreground scheduling and the compare-match interrupt both rewrite
//! every active slot based on how many ticks elapsed since the counter was
//! last reset. The only lock is the compare-match interrupt enable bit:
//! foreground code clears it for the whole read-modify-write, and the
//! interrupt never preempts itself.

use rawr_hal::TimerCounter;

use super::callback::Callback;
use super::control::DelayControl;
use super::scale::TickScale;
use super::schedule::{Schedule, Timers};
use super::slot::{self, Slot};
use super::MuxError;
use crate::chrono::Milliseconds;

/// Number of slots when none is specified
pub const DEFAULT_CAPACITY: usize = 5;

/// Virtual timers multiplexed onto one hardware timer/counter
///
/// Owning `T` means owning the timer unit: a second multiplexer for the
/// same physical timer cannot be built. The platform layer must route the
/// unit's compare-match vector to [`on_compare_match`](Self::on_compare_match).
pub struct TimerMux<T: TimerCounter, const N: usize = DEFAULT_CAPACITY> {
    timer: T,
    scale: TickScale,
    slots: [Slot; N],
}

impl<T: TimerCounter, const N: usize> TimerMux<T, N> {
    const CAPACITY_FITS: () = assert!(
        N > 0 && N < u8::MAX as usize,
        "timer mux capacity must be between 1 and 254"
    );

    /// Take over `timer` and start it with the scale's prescaler
    ///
    /// The compare-match interrupt stays disabled until the first delay is
    /// scheduled.
    pub fn new(mut timer: T, scale: TickScale) -> Result<Self, MuxError> {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_FITS;

        timer.disable_compare_interrupt();
        timer.start(scale.prescaler())?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "timer mux: TC{} started, prescaler {}, milliscaler {}",
            T::INDEX,
            scale.prescaler(),
            scale.milliscaler()
        );

        Ok(Self {
            timer,
            scale,
            slots: [Slot::EMPTY; N],
        })
    }

    /// Stop multiplexing and hand the timer back
    pub fn release(mut self) -> T {
        self.timer.disable_compare_interrupt();
        self.timer
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn scale(&self) -> &TickScale {
        &self.scale
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of pending delays
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active()).count()
    }

    /// Ticks left on a pending delay, counted from the last counter reset
    pub fn remaining_ticks(&self, handle: &DelayControl) -> Option<u16> {
        slot::remaining_ticks(&self.slots, handle)
    }

    /// Compare-match interrupt body
    ///
    /// Charges the expired period to every slot, fires the expired ones in
    /// slot order, then programs the next deadline or disarms the
    /// interrupt when nothing is left.
    pub fn on_compare_match(&mut self) {
        // The counter may already read 0 after the match; top() is the
        // length of the period that just ended.
        let curr_ticks = self.timer.top();

        for i in 0..N {
            let slot = self.slots[i];
            let callback = match slot.callback {
                Some(callback) if !slot.fresh => callback,
                _ => continue,
            };

            match slot.remaining_ticks.checked_sub(curr_ticks) {
                Some(remaining) if remaining > 0 => {
                    self.slots[i].remaining_ticks = remaining;
                }
                _ => {
                    // Update the slot before the callback runs, so the
                    // callback can cancel itself or reuse a one-shot slot.
                    let expired = &mut self.slots[i];
                    if expired.initial_ticks == 0 {
                        expired.callback = None;
                    } else {
                        expired.remaining_ticks = expired.initial_ticks;
                    }

                    #[cfg(feature = "defmt")]
                    defmt::trace!("timer mux: slot {} fired", i);

                    callback.invoke(&mut Timers::new(&mut self.slots, &self.scale));
                }
            }
        }

        for slot in self.slots.iter_mut() {
            slot.fresh = false;
        }

        match slot::next_ticks(&self.slots, T::MAX_TICKS) {
            Some(next_ticks) => {
                self.timer.set_top(next_ticks);
                self.timer.set_counter(0);
            }
            None => {
                #[cfg(feature = "defmt")]
                defmt::trace!("timer mux: idle");

                self.timer.disable_compare_interrupt();
            }
        }
    }

    /// Ticks since the counter was last reset
    ///
    /// A match that went unserviced while the interrupt was disabled has
    /// already wrapped the counter, so the whole compare period counts too.
    fn elapsed_ticks(&self) -> u16 {
        let counter = self.timer.counter();
        if self.timer.compare_pending() {
            self.timer.top().saturating_add(counter)
        } else {
            counter
        }
    }

    /// Program the soonest deadline and arm the interrupt, if anything is pending
    fn rearm(&mut self) {
        if let Some(next_ticks) = slot::next_ticks(&self.slots, T::MAX_TICKS) {
            self.timer.set_top(next_ticks);
            self.timer.set_counter(0);
            self.timer.enable_compare_interrupt();
        }
    }
}

impl<T: TimerCounter, const N: usize> Schedule for TimerMux<T, N> {
    fn try_schedule(
        &mut self,
        duration: Milliseconds,
        recurring: bool,
        callback: Callback,
    ) -> Result<DelayControl, MuxError> {
        self.timer.disable_compare_interrupt();

        let elapsed = self.elapsed_ticks();
        slot::elapse(&mut self.slots, elapsed);

        let ticks = self.scale.ticks(duration);
        let result = slot::claim(&mut self.slots, ticks, recurring, callback, false);
        self.rearm();
        result
    }

    fn cancel(&mut self, handle: &mut DelayControl) {
        slot::cancel(&mut self.slots, handle);
    }

    fn is_active(&self, handle: &DelayControl) -> bool {
        slot::is_active(&self.slots, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrono::Hertz;
    use crate::timer_mux::callback::Handler;
    use crate::timer_mux::mock::{advance, MockTimer};
    use crate::timer_mux::scale::MuxConfig;
    use rawr_hal::PRESCALERS_SYNC;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// 1 MHz: prescaler 256, 4 ticks per millisecond (100 ms = 400 ticks)
    const SCALE: TickScale = TickScale::new(&MuxConfig::new(Hertz::new(1_000_000)), PRESCALERS_SYNC);

    fn ms(count: u16) -> Milliseconds {
        Milliseconds::new(count)
    }

    fn mux8() -> TimerMux<MockTimer<255>> {
        TimerMux::new(MockTimer::new(), SCALE).unwrap()
    }

    fn mux16() -> TimerMux<MockTimer<{ u16::MAX }>> {
        TimerMux::new(MockTimer::new(), SCALE).unwrap()
    }

    fn noop(_: &mut Timers<'_>) {}

    #[test]
    fn test_new_starts_timer_disarmed() {
        let mux = mux8();
        assert_eq!(mux.timer().prescaler(), Some(256));
        assert!(!mux.timer().compare_interrupt_enabled());
        assert_eq!(mux.capacity(), DEFAULT_CAPACITY);
        assert_eq!(mux.active_count(), 0);
    }

    #[test]
    fn test_new_rejects_unsupported_prescaler() {
        let scale = TickScale::new(
            &MuxConfig::new(Hertz::new(1_000_000))
                .with_prescaler(32)
                .with_max_duration(Milliseconds::new(1_000)),
            &[32],
        );
        let result = TimerMux::<MockTimer>::new(MockTimer::new(), scale);
        assert!(matches!(
            result,
            Err(MuxError::Timer(rawr_hal::TimerError::UnsupportedPrescaler(32)))
        ));
    }

    #[test]
    fn test_once_fires_once_and_idles() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        let handle = mux.once(ms(100), |_| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        assert!(mux.is_active(&handle));
        assert_eq!(mux.timer().top(), 400);
        assert!(mux.timer().compare_interrupt_enabled());

        advance(&mut mux, 399);
        assert_eq!(FIRED.load(Ordering::SeqCst), 0);
        advance(&mut mux, 1);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
        assert!(!mux.is_active(&handle));
        assert!(!mux.timer().compare_interrupt_enabled());

        // Stays idle until something is scheduled again
        advance(&mut mux, 5_000);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
        assert_eq!(mux.timer().interrupts, 1);
        mux.once(ms(10), noop);
        assert!(mux.timer().compare_interrupt_enabled());
    }

    #[test]
    fn test_capacity_five_succeeds() {
        let mut mux = mux8();
        for d in [100, 200, 300, 400, 500] {
            mux.once(ms(d), noop);
        }
        assert_eq!(mux.active_count(), 5);
        assert_eq!(
            mux.try_schedule(ms(600), false, Callback::Fn(noop)),
            Err(MuxError::Exhausted)
        );
        // Failed attempt leaves the deadline armed
        assert!(mux.timer().compare_interrupt_enabled());
    }

    #[test]
    #[should_panic(expected = "no free delay slot")]
    fn test_sixth_delay_aborts() {
        let mut mux = mux8();
        for d in [100, 200, 300, 400, 500] {
            mux.once(ms(d), noop);
        }
        mux.once(ms(600), noop);
    }

    #[test]
    fn test_cancelled_repeat_never_fires() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        let mut handle = mux.repeat(ms(1_000), |_| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        advance(&mut mux, 2_000);
        handle.cancel(&mut mux);
        assert!(!handle.is_set());

        // Lazy: the deadline stays armed until it passes
        assert!(mux.timer().compare_interrupt_enabled());
        advance(&mut mux, 2_000);
        assert!(!mux.timer().compare_interrupt_enabled());

        advance(&mut mux, 10_000);
        assert_eq!(FIRED.load(Ordering::SeqCst), 0);
        assert_eq!(mux.active_count(), 0);
    }

    #[test]
    fn test_nested_once_from_repeat() {
        static A: AtomicU32 = AtomicU32::new(0);
        static B: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        let handle = mux.repeat(ms(250), |timers| {
            A.fetch_add(1, Ordering::SeqCst);
            timers.once(Milliseconds::new(100), |_| {
                B.fetch_add(1, Ordering::SeqCst);
            });
        });
        assert_eq!(mux.timer().top(), 1_000);

        advance(&mut mux, 1_000);
        assert_eq!(A.load(Ordering::SeqCst), 1);
        assert_eq!(B.load(Ordering::SeqCst), 0);
        // min(250 ms reload, 100 ms) from the reset that ended the interrupt
        assert_eq!(mux.timer().top(), 400);
        assert_eq!(mux.remaining_ticks(&handle), Some(1_000));

        advance(&mut mux, 400);
        assert_eq!(B.load(Ordering::SeqCst), 1);
        assert_eq!(mux.timer().top(), 600);

        advance(&mut mux, 600);
        assert_eq!(A.load(Ordering::SeqCst), 2);
        assert_eq!(B.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deadline_is_minimum_of_active_slots() {
        let mut mux = mux16();
        mux.once(ms(300), noop);
        assert_eq!(mux.timer().top(), 1_200);
        mux.repeat(ms(500), noop);
        assert_eq!(mux.timer().top(), 1_200);
        mux.once(ms(100), noop);
        assert_eq!(mux.timer().top(), 400);

        // 400 ticks in: remaining 800 and 1600
        advance(&mut mux, 400);
        assert_eq!(mux.timer().top(), 800);
        assert_eq!(mux.active_count(), 2);
    }

    #[test]
    fn test_schedule_charges_elapsed_ticks() {
        static ORDER: Mutex<Vec<u8>> = Mutex::new(Vec::new());
        let mut mux = mux16();

        let first = mux.once(ms(100), |_| ORDER.lock().unwrap().push(0));
        advance(&mut mux, 150);
        mux.once(ms(50), |_| ORDER.lock().unwrap().push(1));
        assert_eq!(mux.remaining_ticks(&first), Some(250));
        assert_eq!(mux.timer().top(), 200);

        advance(&mut mux, 200);
        assert_eq!(*ORDER.lock().unwrap(), [1]);
        assert_eq!(mux.timer().top(), 50);

        // 150 + 200 + 50 = 400 ticks after the first was scheduled
        advance(&mut mux, 50);
        assert_eq!(*ORDER.lock().unwrap(), [1, 0]);
    }

    #[test]
    fn test_long_delay_on_8bit_counter() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux8();

        mux.once(ms(100), |_| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        // 400 ticks do not fit; run in 255 + 145
        assert_eq!(mux.timer().top(), 255);
        advance(&mut mux, 255);
        assert_eq!(FIRED.load(Ordering::SeqCst), 0);
        assert_eq!(mux.timer().top(), 145);
        advance(&mut mux, 145);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clamped_periods_do_not_drift() {
        static ONCE: AtomicU32 = AtomicU32::new(0);
        static REPEAT: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux8();

        // 4000 ticks: 15 full 255-tick periods plus 175
        mux.once(ms(1_000), |_| {
            ONCE.fetch_add(1, Ordering::SeqCst);
        });
        advance(&mut mux, 3_999);
        assert_eq!(ONCE.load(Ordering::SeqCst), 0);
        advance(&mut mux, 1);
        assert_eq!(ONCE.load(Ordering::SeqCst), 1);
        assert_eq!(mux.timer().interrupts, 16);

        mux.repeat(ms(100), |_| {
            REPEAT.fetch_add(1, Ordering::SeqCst);
        });
        advance(&mut mux, 3_999);
        assert_eq!(REPEAT.load(Ordering::SeqCst), 9);
        advance(&mut mux, 1);
        assert_eq!(REPEAT.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_simultaneous_expiry_fires_in_slot_order() {
        static ORDER: Mutex<Vec<u8>> = Mutex::new(Vec::new());
        let mut mux = mux16();

        mux.once(ms(200), |_| ORDER.lock().unwrap().push(0));
        mux.once(ms(100), |_| ORDER.lock().unwrap().push(1));
        advance(&mut mux, 400);
        assert_eq!(*ORDER.lock().unwrap(), [1]);

        // Slot 1 is free again; both land on slot 0's deadline
        mux.once(ms(100), |_| ORDER.lock().unwrap().push(2));
        mux.once(ms(100), |_| ORDER.lock().unwrap().push(3));
        advance(&mut mux, 400);
        assert_eq!(*ORDER.lock().unwrap(), [1, 0, 2, 3]);
    }

    #[test]
    fn test_recurring_reload_is_exact() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        let handle = mux.repeat(ms(100), |_| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        for n in 1..=5 {
            advance(&mut mux, 400);
            assert_eq!(FIRED.load(Ordering::SeqCst), n);
            assert_eq!(mux.remaining_ticks(&handle), Some(400));
            assert_eq!(mux.timer().top(), 400);
        }
    }

    #[test]
    fn test_slot_reuse_and_stale_handles() {
        let mut mux = mux8();
        let a = mux.once(ms(100), noop);
        let mut b = mux.once(ms(200), noop);
        let c = mux.once(ms(300), noop);
        let stale = b;

        mux.cancel(&mut b);
        let d = mux.once(ms(400), noop);
        assert_eq!(d.index(), Some(1));
        assert_ne!(d, stale);
        assert!(stale.is_set());
        assert!(!mux.is_active(&stale));

        // Cancelling through the stale handle must not touch the new delay
        let mut stale = stale;
        mux.cancel(&mut stale);
        assert!(mux.is_active(&d));
        assert!(mux.is_active(&c));

        // No two live handles share a slot
        let indices: Vec<_> = [a, c, d].iter().filter_map(|h| h.index()).collect();
        assert_eq!(indices, [0, 2, 1]);
    }

    #[test]
    fn test_one_shot_slot_released_on_expiry() {
        let mut mux = mux16();
        let first = mux.once(ms(10), noop);
        advance(&mut mux, 40);
        assert!(!mux.is_active(&first));
        let second = mux.once(ms(10), noop);
        assert_eq!(second.index(), first.index());
        assert!(!mux.is_active(&first));
    }

    #[test]
    fn test_callback_reuses_own_slot_when_full() {
        static CHAINED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        mux.once(ms(10), |timers| {
            timers.once(Milliseconds::new(10), |_| {
                CHAINED.fetch_add(1, Ordering::SeqCst);
            });
        });
        for d in [1_000, 1_000, 1_000, 1_000] {
            mux.once(ms(d), noop);
        }
        advance(&mut mux, 40);
        assert_eq!(mux.active_count(), 5);
        advance(&mut mux, 40);
        assert_eq!(CHAINED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repeat_cancels_itself() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        static HANDLE: Mutex<DelayControl> = Mutex::new(DelayControl::EMPTY);
        let mut mux = mux16();

        let handle = mux.repeat(ms(10), |timers| {
            if FIRED.fetch_add(1, Ordering::SeqCst) == 2 {
                HANDLE.lock().unwrap().cancel(timers);
            }
        });
        *HANDLE.lock().unwrap() = handle;

        advance(&mut mux, 1_000);
        assert_eq!(FIRED.load(Ordering::SeqCst), 3);
        assert!(!mux.is_active(&handle));
        assert!(!mux.timer().compare_interrupt_enabled());
    }

    #[test]
    fn test_callback_cancels_later_slot() {
        static VICTIM: Mutex<DelayControl> = Mutex::new(DelayControl::EMPTY);
        static VICTIM_FIRED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        mux.once(ms(10), |timers| {
            timers.cancel(&mut VICTIM.lock().unwrap());
        });
        let victim = mux.once(ms(10), |_| {
            VICTIM_FIRED.fetch_add(1, Ordering::SeqCst);
        });
        *VICTIM.lock().unwrap() = victim;

        advance(&mut mux, 40);
        assert_eq!(VICTIM_FIRED.load(Ordering::SeqCst), 0);
        assert_eq!(mux.active_count(), 0);
    }

    #[test]
    fn test_handler_callbacks() {
        struct Counter(AtomicU32);

        impl Handler for Counter {
            fn fire(&self, _timers: &mut Timers<'_>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        static COUNTER: Counter = Counter(AtomicU32::new(0));
        let mut mux = mux16();

        mux.repeat_handler(ms(50), &COUNTER);
        mux.once_handler(ms(120), &COUNTER);
        // 50, 100, 120, 150, 200 ms
        advance(&mut mux, 800);
        assert_eq!(COUNTER.0.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_match_missed_while_disarmed() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        let mut mux = mux16();

        mux.once(ms(10), |_| {
            FIRED.fetch_add(1, Ordering::SeqCst);
        });
        // Something else masks the interrupt across the deadline
        mux.timer_mut().disable_compare_interrupt();
        advance(&mut mux, 45);
        assert!(mux.timer().compare_pending());

        // 40 + 5 ticks elapsed: the overdue delay is due immediately
        let later = mux.once(ms(100), noop);
        // Shortest programmable period
        assert_eq!(mux.timer().top(), 1);
        advance(&mut mux, 1);
        assert_eq!(FIRED.load(Ordering::SeqCst), 1);
        assert_eq!(mux.remaining_ticks(&later), Some(399));
        assert_eq!(mux.timer().top(), 399);
    }

    #[test]
    fn test_release_disarms() {
        let mut mux = mux8();
        mux.once(ms(10), noop);
        let timer = mux.release();
        assert!(!timer.compare_interrupt_enabled());
    }
}
