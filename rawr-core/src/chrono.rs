//! Fixed-point time types
//!
//! Each duration type is an unsigned count with a fixed scale. The count
//! types are sized to hold about a minute, which is plenty for delays
//! driven off an 8- or 16-bit timer.
//!
//! Hertz is never plural.

use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// Round-half-up integer division: `(dividend + divisor / 2) / divisor`
pub const fn round_div(dividend: u64, divisor: u64) -> u64 {
    (dividend + divisor / 2) / divisor
}

/// Round-half-up integer division for every count width
pub trait RoundDiv<Rhs = Self> {
    type Output;

    fn round_div(self, divisor: Rhs) -> Self::Output;
}

macro_rules! impl_round_div {
    ($($int:ty),*) => {
        $(
            impl RoundDiv for $int {
                type Output = $int;

                #[inline]
                fn round_div(self, divisor: $int) -> $int {
                    (self + divisor / 2) / divisor
                }
            }
        )*
    };
}

impl_round_div!(u8, u16, u32, u64, usize);

/// Frequency in cycles per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hertz(u64);

impl Hertz {
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    pub const fn count(self) -> u64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Duration of one cycle, rounded to the nearest nanosecond
    pub const fn period(self) -> Nanoseconds {
        Nanoseconds::new(round_div(1_000_000_000, self.0))
    }
}

impl Div<u64> for Hertz {
    type Output = Hertz;

    fn div(self, divisor: u64) -> Hertz {
        Hertz(self.0 / divisor)
    }
}

impl RoundDiv<u64> for Hertz {
    type Output = Hertz;

    fn round_div(self, divisor: u64) -> Hertz {
        Hertz(round_div(self.0, divisor))
    }
}

macro_rules! time_unit {
    ($(#[$meta:meta])* $name:ident, $int:ty, $per_second:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct $name($int);

        impl $name {
            /// Units per second
            pub const PER_SECOND: u64 = $per_second;

            pub const fn new(count: $int) -> Self {
                Self(count)
            }

            pub const fn count(self) -> $int {
                self.0
            }

            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }
        }

        impl Add for $name {
            type Output = $name;

            fn add(self, addend: $name) -> $name {
                $name(self.0 + addend.0)
            }
        }

        impl Sub for $name {
            type Output = $name;

            fn sub(self, subtrahend: $name) -> $name {
                $name(self.0 - subtrahend.0)
            }
        }

        impl Mul<$int> for $name {
            type Output = $name;

            fn mul(self, multiplier: $int) -> $name {
                $name(self.0 * multiplier)
            }
        }

        impl Div<$int> for $name {
            type Output = $name;

            fn div(self, divisor: $int) -> $name {
                $name(self.0 / divisor)
            }
        }

        impl RoundDiv<$int> for $name {
            type Output = $name;

            fn round_div(self, divisor: $int) -> $name {
                $name(self.0.round_div(divisor))
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, addend: $name) {
                self.0 += addend.0;
            }
        }

        impl SubAssign for $name {
            fn sub_assign(&mut self, subtrahend: $name) {
                self.0 -= subtrahend.0;
            }
        }

        impl MulAssign<$int> for $name {
            fn mul_assign(&mut self, multiplier: $int) {
                self.0 *= multiplier;
            }
        }

        impl DivAssign<$int> for $name {
            fn div_assign(&mut self, divisor: $int) {
                self.0 /= divisor;
            }
        }
    };
}

time_unit!(
    /// Whole seconds
    Seconds, u8, 1
);
time_unit!(
    /// Milliseconds, the unit the timer multiplexer schedules in
    Milliseconds, u16, 1_000
);
time_unit!(
    /// Microseconds
    Microseconds, u32, 1_000_000
);
time_unit!(
    /// Nanoseconds
    Nanoseconds, u64, 1_000_000_000
);

/// A duration too long for the target unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange;

// Only up to 65 s fit in Milliseconds.
impl TryFrom<Seconds> for Milliseconds {
    type Error = OutOfRange;

    fn try_from(s: Seconds) -> Result<Self, Self::Error> {
        (s.0 as u16).checked_mul(1_000).map(Milliseconds).ok_or(OutOfRange)
    }
}

impl From<Milliseconds> for Microseconds {
    fn from(ms: Milliseconds) -> Self {
        Microseconds(ms.0 as u32 * 1_000)
    }
}

impl From<Microseconds> for Nanoseconds {
    fn from(us: Microseconds) -> Self {
        Nanoseconds(us.0 as u64 * 1_000)
    }
}

impl From<Milliseconds> for Nanoseconds {
    fn from(ms: Milliseconds) -> Self {
        Nanoseconds(ms.0 as u64 * 1_000_000)
    }
}
