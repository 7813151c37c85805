//! Interrupt vector binding for timer multiplexers
//!
//! Each timer unit has one static slot holding its multiplexer, and its
//! `TIMERn_COMPA` vector services whatever is bound there. Foreground code
//! reaches the multiplexer through `with_tcN`, inside a critical section.
//!
//! Callbacks already run inside the vector's critical section; they must
//! schedule through the [`Timers`](rawr_core::Timers) context they are
//! handed, never through `with_tcN`.

use core::cell::RefCell;

use avr_device::interrupt::{self, Mutex};
use rawr_core::TimerMux;

use crate::timer::{Timer0, Timer1, Timer2};

/// Errors from binding a multiplexer to its vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BindError {
    /// A multiplexer is already bound to this timer unit
    AlreadyBound,
}

macro_rules! bind_timer {
    ($mux:ident, $timer:ty, $slot:ident, $bind:ident, $unbind:ident, $with:ident, $vector:ident) => {
        /// Multiplexer type serviced by this timer's vector
        pub type $mux = TimerMux<$timer>;

        static $slot: Mutex<RefCell<Option<$mux>>> = Mutex::new(RefCell::new(None));

        /// Bind `mux` to the compare-match vector
        ///
        /// On failure the multiplexer is handed back alongside the error.
        pub fn $bind(mux: $mux) -> Result<(), (BindError, $mux)> {
            interrupt::free(|cs| {
                let mut slot = $slot.borrow(cs).borrow_mut();
                if slot.is_some() {
                    return Err((BindError::AlreadyBound, mux));
                }
                *slot = Some(mux);
                Ok(())
            })
        }

        /// Unbind and return the multiplexer, if any
        pub fn $unbind() -> Option<$mux> {
            interrupt::free(|cs| $slot.borrow(cs).borrow_mut().take())
        }

        /// Run `f` on the bound multiplexer
        pub fn $with<R>(f: impl FnOnce(&mut $mux) -> R) -> Option<R> {
            interrupt::free(|cs| $slot.borrow(cs).borrow_mut().as_mut().map(f))
        }

        #[cfg(target_arch = "avr")]
        #[avr_device::interrupt(atmega328p)]
        fn $vector() {
            interrupt::free(|cs| {
                if let Some(mux) = $slot.borrow(cs).borrow_mut().as_mut() {
                    mux.on_compare_match();
                }
            });
        }
    };
}

bind_timer!(Tc0Mux, Timer0, TC0_MUX, bind_tc0, unbind_tc0, with_tc0, TIMER0_COMPA);
bind_timer!(Tc1Mux, Timer1, TC1_MUX, bind_tc1, unbind_tc1, with_tc1, TIMER1_COMPA);
bind_timer!(Tc2Mux, Timer2, TC2_MUX, bind_tc2, unbind_tc2, with_tc2, TIMER2_COMPA);
