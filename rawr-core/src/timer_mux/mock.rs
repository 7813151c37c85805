//! Simulated timer/counter for host tests

use rawr_hal::{clock_select, ctc_compare, ctc_period, TimerCounter, TimerError, PRESCALERS_SYNC};

use super::mux::TimerMux;

/// Timer/counter in CTC mode with a `MAX`-tick counter
///
/// Models the register like the hardware does: the counter runs
/// `0..=ocr` and clears on the tick after reaching `ocr`.
#[derive(Debug, Default)]
pub struct MockTimer<const MAX: u16 = 255> {
    counter: u16,
    ocr: u16,
    enabled: bool,
    pending: bool,
    prescaler: Option<u16>,
    /// Compare matches serviced so far
    pub interrupts: u32,
}

impl<const MAX: u16> MockTimer<MAX> {
    pub fn new() -> Self {
        Self {
            counter: 0,
            ocr: 0,
            enabled: false,
            pending: false,
            prescaler: None,
            interrupts: 0,
        }
    }

    pub fn prescaler(&self) -> Option<u16> {
        self.prescaler
    }

    /// Advance one tick; returns true on a compare match
    fn tick(&mut self) -> bool {
        if self.prescaler.is_none() {
            return false;
        }
        if self.counter == self.ocr {
            self.counter = 0;
            self.pending = true;
            return true;
        }
        self.counter = if self.counter == MAX { 0 } else { self.counter + 1 };
        false
    }
}

impl<const MAX: u16> TimerCounter for MockTimer<MAX> {
    const INDEX: u8 = 0;
    const MAX_TICKS: u16 = MAX;
    const PRESCALERS: &'static [u16] = PRESCALERS_SYNC;

    fn counter(&self) -> u16 {
        self.counter
    }

    fn set_counter(&mut self, ticks: u16) {
        self.counter = ticks;
        self.pending = false;
    }

    fn top(&self) -> u16 {
        ctc_period(self.ocr)
    }

    fn set_top(&mut self, ticks: u16) {
        assert!(ticks <= MAX, "period {} exceeds counter width", ticks);
        self.ocr = ctc_compare(ticks);
    }

    fn enable_compare_interrupt(&mut self) {
        self.enabled = true;
    }

    fn disable_compare_interrupt(&mut self) {
        self.enabled = false;
    }

    fn compare_interrupt_enabled(&self) -> bool {
        self.enabled
    }

    fn compare_pending(&self) -> bool {
        self.pending
    }

    fn start(&mut self, prescaler: u16) -> Result<(), TimerError> {
        clock_select(Self::PRESCALERS, prescaler).ok_or(TimerError::UnsupportedPrescaler(prescaler))?;
        self.prescaler = Some(prescaler);
        self.counter = 0;
        self.enabled = false;
        Ok(())
    }
}

/// Run the timer for `ticks` ticks, servicing armed compare matches
pub fn advance<const MAX: u16, const N: usize>(mux: &mut TimerMux<MockTimer<MAX>, N>, ticks: u32) {
    for _ in 0..ticks {
        let timer = mux.timer_mut();
        if timer.tick() && timer.enabled {
            timer.pending = false;
            timer.interrupts += 1;
            mux.on_compare_match();
        }
    }
}
