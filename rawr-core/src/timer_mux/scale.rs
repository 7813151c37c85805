//! Millisecond to timer tick conversion
//!
//! Directly calculating `ticks = duration * frequency / prescaler / 1000`
//! overflows 16 bits on `duration * frequency`, while dividing the
//! frequency down to ticks per millisecond first loses too much precision
//! at low clock rates.
//!
//! Instead the prescaled frequency is divided by a "milliscaler" `m` (a
//! divisor of 1000) chosen so that `duration * (frequency / prescaler / m)`
//! still fits in 16 bits at the longest supported duration, and the result
//! is then divided by `1000 / m`. Every division rounds half up.
//!
//! All of this is meant to be evaluated once, in a `const` item:
//!
//! ```
//! use rawr_core::{Hertz, MuxConfig, TickScale};
//! use rawr_hal::PRESCALERS_SYNC;
//!
//! const SCALE: TickScale = TickScale::new(&MuxConfig::new(Hertz::new(1_000_000)), PRESCALERS_SYNC);
//! assert_eq!(SCALE.prescaler(), 256);
//! assert_eq!(SCALE.milliscaler(), 250);
//! ```

use crate::chrono::{round_div, Hertz, Milliseconds, Nanoseconds};

/// Longest tick period a default prescaler may produce
pub const MAX_TICK_PERIOD: Nanoseconds = Nanoseconds::new(500_000);

/// Longest delay the default milliscaler must represent without overflow
pub const DEFAULT_MAX_DURATION: Milliseconds = Milliseconds::new(3_000);

/// Milliscaler candidates, smallest (most precise) first
pub const MILLISCALERS: [u16; 4] = [125, 250, 500, 1_000];

/// Rejected timer multiplexer configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Clock frequency is zero
    ZeroFrequency,
    /// The timer unit has no such prescaler
    UnsupportedPrescaler(u16),
    /// Milliscaler does not divide 1000
    InvalidMilliscaler(u16),
    /// `max_duration` does not fit in 16-bit milliscaled ticks, or is zero
    DurationOutOfRange,
    /// Prescaled frequency rounds to zero ticks per milliscale unit
    ResolutionTooLow,
}

/// Timer multiplexer configuration
///
/// `None` fields are derived from the frequency by [`TickScale::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxConfig {
    /// CPU clock feeding the timer prescaler (F_CPU)
    pub frequency: Hertz,
    /// Longest delay that must convert without overflow
    pub max_duration: Milliseconds,
    /// Explicit prescaler
    pub prescaler: Option<u16>,
    /// Explicit milliscaler
    pub milliscaler: Option<u16>,
}

impl MuxConfig {
    /// Configuration with derived prescaler and milliscaler
    pub const fn new(frequency: Hertz) -> Self {
        Self {
            frequency,
            max_duration: DEFAULT_MAX_DURATION,
            prescaler: None,
            milliscaler: None,
        }
    }

    pub const fn with_max_duration(mut self, max_duration: Milliseconds) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub const fn with_prescaler(mut self, prescaler: u16) -> Self {
        self.prescaler = Some(prescaler);
        self
    }

    pub const fn with_milliscaler(mut self, milliscaler: u16) -> Self {
        self.milliscaler = Some(milliscaler);
        self
    }
}

/// Period of one tick at `frequency / prescaler`
///
/// A prescaled frequency that rounds to zero has an unbounded period.
pub const fn prescaled_period(frequency: Hertz, prescaler: u16) -> Nanoseconds {
    let ticks_per_second = round_div(frequency.count(), prescaler as u64);
    if ticks_per_second == 0 {
        return Nanoseconds::new(u64::MAX);
    }
    Nanoseconds::new(round_div(1_000_000_000, ticks_per_second))
}

/// Largest prescaler keeping the tick period within [`MAX_TICK_PERIOD`]
///
/// Falls back to the smallest prescaler when none qualifies. Returns `None`
/// only for an empty list.
pub const fn default_prescaler(frequency: Hertz, prescalers: &[u16]) -> Option<u16> {
    let mut best: Option<u16> = None;
    let mut smallest: Option<u16> = None;
    let mut i = 0;
    while i < prescalers.len() {
        let p = prescalers[i];
        smallest = match smallest {
            Some(s) if s <= p => Some(s),
            _ => Some(p),
        };
        if prescaled_period(frequency, p).count() <= MAX_TICK_PERIOD.count() {
            best = match best {
                Some(b) if b >= p => Some(b),
                _ => Some(p),
            };
        }
        i += 1;
    }
    match best {
        Some(p) => Some(p),
        None => smallest,
    }
}

/// Prescaled ticks per `milliscaler` ticks-per-second
pub const fn milliscale_factor(frequency: Hertz, prescaler: u16, milliscaler: u16) -> u64 {
    round_div(
        round_div(frequency.count(), prescaler as u64),
        milliscaler as u64,
    )
}

/// Duration multiplied by the milliscale factor, before the final division
pub const fn milliscaled_ticks(
    duration: Milliseconds,
    frequency: Hertz,
    prescaler: u16,
    milliscaler: u16,
) -> u64 {
    duration.count() as u64 * milliscale_factor(frequency, prescaler, milliscaler)
}

/// Smallest milliscaler keeping `max_duration` within 16 bits
pub const fn default_milliscaler(
    frequency: Hertz,
    max_duration: Milliseconds,
    prescaler: u16,
) -> Option<u16> {
    let mut i = 0;
    while i < MILLISCALERS.len() {
        let m = MILLISCALERS[i];
        if milliscaled_ticks(max_duration, frequency, prescaler, m) <= u16::MAX as u64 {
            return Some(m);
        }
        i += 1;
    }
    None
}

const fn contains(prescalers: &[u16], prescaler: u16) -> bool {
    let mut i = 0;
    while i < prescalers.len() {
        if prescalers[i] == prescaler {
            return true;
        }
        i += 1;
    }
    false
}

/// Fixed conversion from milliseconds to timer ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickScale {
    frequency: Hertz,
    max_duration: Milliseconds,
    prescaler: u16,
    milliscaler: u16,
    /// `round(round(frequency / prescaler) / milliscaler)`
    factor: u16,
    /// `1000 / milliscaler`, exact
    divisor: u16,
}

impl TickScale {
    /// Derive the scale for a timer unit with the given prescalers
    pub const fn try_new(config: &MuxConfig, prescalers: &[u16]) -> Result<Self, ConfigError> {
        let frequency = config.frequency;
        if frequency.is_zero() {
            return Err(ConfigError::ZeroFrequency);
        }
        if config.max_duration.is_zero() {
            return Err(ConfigError::DurationOutOfRange);
        }

        let prescaler = match config.prescaler {
            Some(p) => {
                if !contains(prescalers, p) {
                    return Err(ConfigError::UnsupportedPrescaler(p));
                }
                p
            }
            None => match default_prescaler(frequency, prescalers) {
                Some(p) => p,
                None => return Err(ConfigError::UnsupportedPrescaler(0)),
            },
        };

        let milliscaler = match config.milliscaler {
            Some(m) => {
                if m == 0 || 1_000 % m != 0 {
                    return Err(ConfigError::InvalidMilliscaler(m));
                }
                if milliscaled_ticks(config.max_duration, frequency, prescaler, m) > u16::MAX as u64 {
                    return Err(ConfigError::DurationOutOfRange);
                }
                m
            }
            None => match default_milliscaler(frequency, config.max_duration, prescaler) {
                Some(m) => m,
                None => return Err(ConfigError::DurationOutOfRange),
            },
        };

        // Bounded by u16::MAX through the max_duration check above.
        let factor = milliscale_factor(frequency, prescaler, milliscaler);
        if factor == 0 {
            return Err(ConfigError::ResolutionTooLow);
        }

        Ok(Self {
            frequency,
            max_duration: config.max_duration,
            prescaler,
            milliscaler,
            factor: factor as u16,
            divisor: 1_000 / milliscaler,
        })
    }

    /// Derive the scale, failing const evaluation on a bad configuration
    pub const fn new(config: &MuxConfig, prescalers: &[u16]) -> Self {
        match Self::try_new(config, prescalers) {
            Ok(scale) => scale,
            Err(ConfigError::ZeroFrequency) => panic!("timer mux: zero clock frequency"),
            Err(ConfigError::UnsupportedPrescaler(_)) => {
                panic!("timer mux: prescaler not supported by this timer")
            }
            Err(ConfigError::InvalidMilliscaler(_)) => {
                panic!("timer mux: milliscaler must divide 1000")
            }
            Err(ConfigError::DurationOutOfRange) => {
                panic!("timer mux: max_duration overflows 16-bit ticks")
            }
            Err(ConfigError::ResolutionTooLow) => {
                panic!("timer mux: prescaled frequency too low for milliscaler")
            }
        }
    }

    /// Ticks for `duration`, saturating past `max_duration`
    pub const fn ticks(&self, duration: Milliseconds) -> u16 {
        let ticks = round_div(
            duration.count() as u64 * self.factor as u64,
            self.divisor as u64,
        );
        if ticks > u16::MAX as u64 {
            u16::MAX
        } else {
            ticks as u16
        }
    }

    pub const fn frequency(&self) -> Hertz {
        self.frequency
    }

    pub const fn max_duration(&self) -> Milliseconds {
        self.max_duration
    }

    pub const fn prescaler(&self) -> u16 {
        self.prescaler
    }

    pub const fn milliscaler(&self) -> u16 {
        self.milliscaler
    }

    /// Nominal tick period
    pub const fn tick_period(&self) -> Nanoseconds {
        prescaled_period(self.frequency, self.prescaler)
    }
}
