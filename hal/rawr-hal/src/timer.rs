//! Timer/counter abstractions
//!
//! An AVR timer/counter is a free-running counter clocked at
//! `F_CPU / prescaler`, paired with output compare registers. When the
//! counter reaches a compare register it raises that channel's
//! compare-match interrupt, if enabled.
//!
//! In CTC mode the counter runs `0..=OCRnA` and clears on the tick after
//! the match, so one compare period lasts `OCRnA + 1` ticks. The
//! [`TimerCounter`] trait speaks in period lengths; [`ctc_compare`] and
//! [`ctc_period`] convert at the register.

/// Prescalers of the synchronous timer/counters (TC0 and TC1)
pub const PRESCALERS_SYNC: &[u16] = &[1, 8, 64, 256, 1024];

/// Prescalers of the asynchronous timer/counter (TC2)
pub const PRESCALERS_ASYNC: &[u16] = &[1, 8, 32, 64, 128, 256, 1024];

/// Errors from timer/counter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// The timer unit has no clock source for this prescaler
    UnsupportedPrescaler(u16),
}

/// Clock-select bits for `prescaler`
///
/// The CSn2:0 encoding of every AVR timer lists its prescalers in ascending
/// order starting at 1, with 0 meaning "stopped".
pub fn clock_select(prescalers: &[u16], prescaler: u16) -> Option<u8> {
    prescalers
        .iter()
        .position(|&p| p == prescaler)
        .map(|i| i as u8 + 1)
}

/// Compare register value for a CTC period of `ticks`
///
/// A zero-length period cannot be programmed; it becomes one tick, the
/// shortest the hardware can do.
pub const fn ctc_compare(ticks: u16) -> u16 {
    ticks.saturating_sub(1)
}

/// CTC period length for compare register value `ocr`
pub const fn ctc_period(ocr: u16) -> u16 {
    ocr.saturating_add(1)
}

/// Timer/counter unit bound to its channel A compare register
///
/// An implementation owns the peripheral of its timer unit, so at most one
/// value exists per physical timer. Register widths narrower than 16 bits
/// are widened; values passed to [`set_top`](Self::set_top) never exceed
/// [`MAX_TICKS`](Self::MAX_TICKS).
pub trait TimerCounter {
    /// Timer unit number (the `n` in TCNTn)
    const INDEX: u8;

    /// Longest compare period, in ticks
    const MAX_TICKS: u16;

    /// Prescalers this unit supports, ascending
    const PRESCALERS: &'static [u16];

    /// Read the live counter
    fn counter(&self) -> u16;

    /// Overwrite the live counter
    ///
    /// Also discards a pending compare match, so a deadline reprogrammed
    /// together with a counter reset cannot fire early.
    fn set_counter(&mut self, ticks: u16);

    /// Length of the compare period in ticks
    ///
    /// After a match this is exactly the number of ticks that period took.
    fn top(&self) -> u16;

    /// Program the compare period to `ticks` ticks
    ///
    /// `0` is treated as the shortest period the unit supports, so
    /// [`top`](Self::top) may read back 1.
    fn set_top(&mut self, ticks: u16);

    /// Arm the compare-match interrupt
    fn enable_compare_interrupt(&mut self);

    /// Disarm the compare-match interrupt
    fn disable_compare_interrupt(&mut self);

    /// Check whether the compare-match interrupt is armed
    fn compare_interrupt_enabled(&self) -> bool;

    /// Check whether the counter has reached the compare register since the
    /// last match was serviced (OCFn flag)
    fn compare_pending(&self) -> bool;

    /// Start counting with the given prescaler
    ///
    /// Leaves the compare-match interrupt disabled.
    fn start(&mut self, prescaler: u16) -> Result<(), TimerError>;
}
