//! Countdown state machine.

use std::time::Duration;
use thiserror::Error;

/// Interval between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Countdown lengths the booth offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CountdownDuration {
    #[default]
    Five,
    Ten,
}

impl CountdownDuration {
    /// Every selectable duration, in display order.
    pub const ALL: [CountdownDuration; 2] = [Self::Five, Self::Ten];

    pub fn seconds(self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Ten => 10,
        }
    }

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        match seconds {
            5 => Some(Self::Five),
            10 => Some(Self::Ten),
            _ => None,
        }
    }
}

/// Countdown errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CountdownError {
    #[error("countdown total must be positive")]
    ZeroDuration,
    #[error("unsupported countdown duration {0}s (must be 5 or 10)")]
    UnsupportedDuration(u32),
}

/// Countdown state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountdownState {
    #[default]
    Idle,
    Running { remaining: u32, total: u32 },
}

/// Identifies the timer started by one `start` call.
///
/// A tick carrying a token from a cancelled timer is ignored, so a restart
/// can never let the old timer fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Token was stale or the countdown is idle.
    Ignored,
    /// Still counting down.
    Running { remaining: u32, total: u32 },
    /// Reached zero on this tick. Reported exactly once per start.
    Expired,
}

/// Timer-driven countdown that reports expiry exactly once per start.
#[derive(Debug, Default)]
pub struct CountdownController {
    state: CountdownState,
    /// Live timer, `None` when cancelled.
    timer: Option<u64>,
    next_timer: u64,
    restarts: u64,
    expirations: u64,
}

impl CountdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) the countdown from `total` seconds.
    pub fn start(&mut self, total: u32) -> Result<TimerToken, CountdownError> {
        if total == 0 {
            return Err(CountdownError::ZeroDuration);
        }

        if let Some(previous) = self.timer.take() {
            self.restarts += 1;
            tracing::debug!(timer = previous, "Cancelled running countdown for restart");
        }

        self.next_timer += 1;
        self.timer = Some(self.next_timer);
        self.state = CountdownState::Running {
            remaining: total,
            total,
        };

        tracing::info!(total, timer = self.next_timer, "Countdown started");
        Ok(TimerToken(self.next_timer))
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        if self.timer != Some(token.0) {
            tracing::trace!(timer = token.0, "Ignoring tick from stale timer");
            return TickOutcome::Ignored;
        }

        match self.state {
            CountdownState::Idle => TickOutcome::Ignored,
            CountdownState::Running { remaining, total } if remaining > 1 => {
                let remaining = remaining - 1;
                self.state = CountdownState::Running { remaining, total };
                tracing::trace!(remaining, total, "Countdown tick");
                TickOutcome::Running { remaining, total }
            }
            CountdownState::Running { total, .. } => {
                self.state = CountdownState::Idle;
                self.timer = None;
                self.expirations += 1;
                tracing::info!(total, "Countdown expired");
                TickOutcome::Expired
            }
        }
    }

    /// Stops the countdown without expiring.
    pub fn cancel(&mut self) {
        if self.timer.take().is_some() {
            tracing::debug!("Countdown cancelled");
        }
        self.state = CountdownState::Idle;
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    /// Seconds left; zero when idle.
    pub fn remaining(&self) -> u32 {
        match self.state {
            CountdownState::Idle => 0,
            CountdownState::Running { remaining, .. } => remaining,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, CountdownState::Running { .. })
    }

    /// Fraction of the countdown still to go, for a progress ring.
    pub fn progress(&self) -> f64 {
        match self.state {
            CountdownState::Idle => 0.0,
            CountdownState::Running { remaining, total } => f64::from(remaining) / f64::from(total),
        }
    }

    /// Starts that replaced a still-running countdown.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Total expirations.
    pub fn expirations(&self) -> u64 {
        self.expirations
    }
}
