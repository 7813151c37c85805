//! Status LED on PB5

use core::cell::RefCell;

use avr_device::atmega328p::PORTB;
use avr_device::interrupt::{self, Mutex};

const LED_BIT: u8 = 1 << 5;

static PORT: Mutex<RefCell<Option<PORTB>>> = Mutex::new(RefCell::new(None));

/// Make PB5 an output, lit or not
pub fn init(portb: PORTB, lit: bool) {
    // SAFETY: only PB5 changes; the other pins keep their configuration.
    portb.ddrb.modify(|r, w| unsafe { w.bits(r.bits() | LED_BIT) });
    interrupt::free(|cs| *PORT.borrow(cs).borrow_mut() = Some(portb));
    if lit {
        set();
    } else {
        clear();
    }
}

fn modify(f: impl FnOnce(u8) -> u8) {
    interrupt::free(|cs| {
        if let Some(port) = PORT.borrow(cs).borrow().as_ref() {
            // SAFETY: every PORTB value is valid.
            port.portb.modify(|r, w| unsafe { w.bits(f(r.bits())) });
        }
    });
}

pub fn set() {
    modify(|bits| bits | LED_BIT);
}

pub fn clear() {
    modify(|bits| bits & !LED_BIT);
}
