//! Delay callbacks
//!
//! Callbacks are stored inline in the slot table, so they are limited to
//! two words: a plain function pointer, or a reference to a `'static`
//! object carrying its own state.

use core::fmt;

use super::schedule::Timers;

/// Stateful callback target
///
/// Implement this on a `static` (typically holding atomics, or an
/// `avr_device::interrupt::Mutex` on target) when a callback needs more
/// than a function pointer.
pub trait Handler: Sync {
    /// Called from the compare-match interrupt when the delay expires
    fn fire(&self, timers: &mut Timers<'_>);
}

/// Callback invoked when a delay expires
///
/// Both forms receive the in-interrupt [`Timers`] context, through which
/// they may schedule or cancel other delays.
#[derive(Clone, Copy)]
pub enum Callback {
    /// Plain function, or a closure that captures nothing
    Fn(fn(&mut Timers<'_>)),
    /// Method on a static object
    Handler(&'static dyn Handler),
}

impl Callback {
    pub(crate) fn invoke(self, timers: &mut Timers<'_>) {
        match self {
            Callback::Fn(f) => f(timers),
            Callback::Handler(h) => h.fire(timers),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Fn(func) => f.debug_tuple("Fn").field(&(*func as *const ())).finish(),
            Callback::Handler(h) => f
                .debug_tuple("Handler")
                .field(&(*h as *const dyn Handler as *const ()))
                .finish(),
        }
    }
}

impl From<fn(&mut Timers<'_>)> for Callback {
    fn from(f: fn(&mut Timers<'_>)) -> Self {
        Callback::Fn(f)
    }
}

impl From<&'static dyn Handler> for Callback {
    fn from(h: &'static dyn Handler) -> Self {
        Callback::Handler(h)
    }
}
