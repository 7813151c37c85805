//! Timer/counter units of the ATmega328P
//!
//! Every unit runs in CTC mode against OCRnA: the counter clears itself on
//! the tick after the compare match, so the period is `OCRnA + 1` ticks.
//! `top`/`set_top` deal in that period length, not the raw register.

use avr_device::atmega328p::{TC0, TC1, TC2};
use rawr_hal::{
    clock_select, ctc_compare, ctc_period, TimerCounter, TimerError, PRESCALERS_ASYNC, PRESCALERS_SYNC,
};

macro_rules! timer_counter {
    (
        $(#[$meta:meta])*
        $name:ident, $tc:ident, $index:expr, $int:ty, $prescalers:expr,
        $tccra:ident = $wgm_a:expr, $tccrb:ident = $wgm_b:expr,
        $tcnt:ident, $ocra:ident, $timsk:ident . $ocie:ident, $tifr:ident . $ocf:ident
    ) => {
        $(#[$meta])*
        pub struct $name {
            tc: $tc,
        }

        impl $name {
            /// Take ownership of the timer unit
            ///
            /// The unit stays stopped until [`TimerCounter::start`].
            pub fn new(tc: $tc) -> Self {
                Self { tc }
            }

            /// Stop the timer and give the peripheral back
            pub fn free(self) -> $tc {
                self.tc.$timsk.modify(|_, w| w.$ocie().clear_bit());
                // SAFETY: 0 selects "no clock source".
                self.tc.$tccrb.write(|w| unsafe { w.bits(0) });
                self.tc
            }
        }

        impl TimerCounter for $name {
            const INDEX: u8 = $index;
            const MAX_TICKS: u16 = <$int>::MAX as u16;
            const PRESCALERS: &'static [u16] = $prescalers;

            fn counter(&self) -> u16 {
                self.tc.$tcnt.read().bits() as u16
            }

            fn set_counter(&mut self, ticks: u16) {
                // SAFETY: every counter value is valid.
                self.tc.$tcnt.write(|w| unsafe { w.bits(ticks as $int) });
                // Writing 1 clears the flag.
                self.tc.$tifr.write(|w| w.$ocf().set_bit());
            }

            fn top(&self) -> u16 {
                ctc_period(self.tc.$ocra.read().bits() as u16)
            }

            fn set_top(&mut self, ticks: u16) {
                let ocr = ctc_compare(ticks);
                // SAFETY: every compare value is valid; callers stay within MAX_TICKS.
                self.tc.$ocra.write(|w| unsafe { w.bits(ocr as $int) });
            }

            fn enable_compare_interrupt(&mut self) {
                self.tc.$timsk.modify(|_, w| w.$ocie().set_bit());
            }

            fn disable_compare_interrupt(&mut self) {
                self.tc.$timsk.modify(|_, w| w.$ocie().clear_bit());
            }

            fn compare_interrupt_enabled(&self) -> bool {
                self.tc.$timsk.read().$ocie().bit_is_set()
            }

            fn compare_pending(&self) -> bool {
                self.tc.$tifr.read().$ocf().bit_is_set()
            }

            fn start(&mut self, prescaler: u16) -> Result<(), TimerError> {
                let cs = clock_select(Self::PRESCALERS, prescaler)
                    .ok_or(TimerError::UnsupportedPrescaler(prescaler))?;

                self.disable_compare_interrupt();
                // SAFETY: WGM bits select CTC mode, CS bits come from the
                // clock-select table of this unit.
                self.tc.$tccra.write(|w| unsafe { w.bits($wgm_a) });
                self.tc.$tccrb.write(|w| unsafe { w.bits($wgm_b | cs) });
                self.set_counter(0);

                #[cfg(feature = "defmt")]
                defmt::debug!("TC{} running, prescaler {}", $index, prescaler);

                Ok(())
            }
        }
    };
}

timer_counter!(
    /// 8-bit timer/counter 0
    Timer0, TC0, 0, u8, PRESCALERS_SYNC,
    tccr0a = 1 << 1, tccr0b = 0,
    tcnt0, ocr0a, timsk0.ocie0a, tifr0.ocf0a
);

timer_counter!(
    /// 16-bit timer/counter 1
    Timer1, TC1, 1, u16, PRESCALERS_SYNC,
    tccr1a = 0, tccr1b = 1 << 3,
    tcnt1, ocr1a, timsk1.ocie1a, tifr1.ocf1a
);

timer_counter!(
    /// 8-bit asynchronous timer/counter 2
    Timer2, TC2, 2, u8, PRESCALERS_ASYNC,
    tccr2a = 1 << 1, tccr2b = 0,
    tcnt2, ocr2a, timsk2.ocie2a, tifr2.ocf2a
);
