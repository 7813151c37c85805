//! Board-agnostic core logic for RAWR
//!
//! This crate contains everything that does not depend on a specific
//! microcontroller:
//!
//! - Fixed-point time types and rounding division
//! - Tick scaling from milliseconds to prescaled timer ticks
//! - Timer multiplexer: many virtual timers on one compare-match interrupt
//!
//! Hardware is reached only through [`rawr_hal::TimerCounter`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod chrono;
pub mod timer_mux;

pub use chrono::{Hertz, Microseconds, Milliseconds, Nanoseconds, OutOfRange, Seconds};
pub use timer_mux::{
    Callback, DelayControl, Handler, MuxConfig, MuxError, Schedule, TickScale, TimerMux, Timers,
};
