//! Capture countdown.
//!
//! An explicit state machine driven by one-second ticks. Restart and cancel
//! are handled through timer tokens instead of closures over shared
//! counters, so a superseded timer can never trigger a capture.

mod controller;

pub use controller::{
    CountdownController, CountdownDuration, CountdownError, CountdownState, TickOutcome,
    TimerToken, TICK_INTERVAL,
};
