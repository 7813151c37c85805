//! RAWR Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits that chip-specific
//! HALs implement for their timer/counter units. The software timer
//! multiplexer in `rawr-core` only ever talks to hardware through them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (rawr-firmware, etc.)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rawr-core (timer multiplexer)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rawr-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ rawr-hal-avr  │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`timer::TimerCounter`] - Counter, compare register and compare-match interrupt

#![no_std]
#![deny(unsafe_code)]

pub mod timer;

// Re-export key items at crate root for convenience
pub use timer::{
    clock_select, ctc_compare, ctc_period, TimerCounter, TimerError, PRESCALERS_ASYNC, PRESCALERS_SYNC,
};
