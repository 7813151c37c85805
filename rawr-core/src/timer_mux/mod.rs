//! Timer multiplexer
//!
//! Runs a fixed number of virtual timers ("delays") off one hardware
//! timer/counter. The compare register is always programmed with the
//! remaining ticks of the soonest-expiring delay; the compare-match
//! interrupt fires expired delays, reloads recurring ones and programs the
//! next deadline, or disarms itself once nothing is left.
//!
//! Every active slot's `remaining_ticks` counts from the last time the
//! hardware counter was reset to 0, which is what lets one counter serve
//! them all.

pub mod callback;
pub mod control;
pub mod mux;
pub mod scale;
pub mod schedule;
mod slot;

#[cfg(test)]
mod mock;

pub use callback::{Callback, Handler};
pub use control::DelayControl;
pub use mux::{TimerMux, DEFAULT_CAPACITY};
pub use scale::{ConfigError, MuxConfig, TickScale};
pub use schedule::{Schedule, Timers};

/// Errors from the timer multiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxError {
    /// Every slot is in use
    Exhausted,
    /// The hardware timer rejected its configuration
    Timer(rawr_hal::TimerError),
}

impl From<rawr_hal::TimerError> for MuxError {
    fn from(e: rawr_hal::TimerError) -> Self {
        MuxError::Timer(e)
    }
}
