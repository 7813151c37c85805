//! ATmega328P HAL for RAWR
//!
//! This crate provides ATmega328P implementations of the shared
//! `rawr-hal` traits, plus the interrupt plumbing the timer multiplexer
//! needs:
//!
//! - [`timer::Timer0`], [`timer::Timer1`], [`timer::Timer2`]: timer/counter
//!   units in CTC mode on compare channel A
//! - [`mux`]: one statically bound multiplexer per timer unit, serviced by
//!   its `TIMERn_COMPA` vector

#![no_std]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod mux;
pub mod timer;

pub use timer::{Timer0, Timer1, Timer2};

// Re-export shared traits from rawr-hal for convenience
pub use rawr_hal::{TimerCounter, TimerError};
