//! RAWR heartbeat demo
//!
//! Blinks an LED on PB5 (the Arduino Uno's on-board LED) twice every
//! second, like a heartbeat. Every transition is a delay on the TC0
//! multiplexer; the CPU sleeps in between.

#![no_std]
#![no_main]

use avr_device::atmega328p::Peripherals;
use panic_halt as _;

use rawr_core::{Hertz, Milliseconds, MuxConfig, Schedule, TickScale, TimerMux, Timers};
use rawr_hal::TimerCounter;
use rawr_hal_avr::mux::{bind_tc0, with_tc0};
use rawr_hal_avr::Timer0;

mod led;

/// CPU clock of the board
const F_CPU: Hertz = Hertz::new(16_000_000);

/// Tick conversion for TC0, fixed at build time
const SCALE: TickScale = TickScale::new(&MuxConfig::new(F_CPU), <Timer0 as TimerCounter>::PRESCALERS);

/// Sleep enable, idle mode
const SMCR_SE_IDLE: u8 = 1;

fn heartbeat(timers: &mut Timers<'_>) {
    led::set();
    timers.once(Milliseconds::new(100), |_| led::clear());
    timers.once(Milliseconds::new(200), |_| led::set());
    timers.once(Milliseconds::new(300), |_| led::clear());
}

#[avr_device::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();

    led::init(dp.PORTB, true);

    let mux = TimerMux::new(Timer0::new(dp.TC0), SCALE).unwrap();
    if bind_tc0(mux).is_err() {
        panic!("TC0 multiplexer already bound");
    }
    with_tc0(|mux| mux.repeat(Milliseconds::new(1_000), heartbeat));

    // SAFETY: SE with SM = 000 selects idle sleep, which TC0 keeps running through.
    dp.CPU.smcr.write(|w| unsafe { w.bits(SMCR_SE_IDLE) });
    // SAFETY: all shared state lives in interrupt::Mutex cells.
    unsafe { avr_device::interrupt::enable() };

    loop {
        avr_device::asm::sleep();
    }
}
