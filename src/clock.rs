//! Clocks that report the current time as an [`Interval`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use crate::config::{ClockConfig, ClockKind};
use crate::error::ValidationError;
use crate::time::Interval;

/// Default uncertainty assumed for the local wall clock, in milliseconds.
pub const DEFAULT_UNCERTAINTY_MS: i64 = 10;

fn default_uncertainty() -> Duration {
    Duration::milliseconds(DEFAULT_UNCERTAINTY_MS)
}

/// Source of the current time.
///
/// Implementations must be callable from many threads at once and must
/// return intervals with `earliest <= latest`.
pub trait Clock: Send + Sync {
    /// Returns an interval that contains the current time.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidInterval` if the clock is configured
    /// with a negative uncertainty.
    fn now(&self) -> Result<Interval, ValidationError>;
}

/// Wall clock with a fixed uncertainty.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    uncertainty: Duration,
}

impl SystemClock {
    /// Creates a clock reporting `[now - uncertainty, now + uncertainty]`.
    #[must_use]
    pub const fn new(uncertainty: Duration) -> Self {
        Self { uncertainty }
    }

    /// Uncertainty applied to each reading.
    #[must_use]
    pub const fn uncertainty(&self) -> Duration {
        self.uncertainty
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(default_uncertainty())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<Interval, ValidationError> {
        Interval::around(Utc::now(), self.uncertainty)
    }
}

#[derive(Debug)]
struct ManualState {
    now: DateTime<Utc>,
    uncertainty: Duration,
}

/// A clock that only moves when told to.
///
/// Starts at the wall-clock time of its creation with the default
/// uncertainty.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    /// Creates a clock stopped at the current wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Creates a clock stopped at `now`.
    #[must_use]
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now,
                uncertainty: default_uncertainty(),
            }),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        self.with_state(|state| state.now = now);
    }

    /// Moves the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.with_state(|state| {
            state.now = state
                .now
                .checked_add_signed(step)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
        });
    }

    /// Changes the uncertainty of subsequent readings.
    ///
    /// A negative uncertainty makes [`Clock::now`] fail.
    pub fn set_uncertainty(&self, uncertainty: Duration) {
        self.with_state(|state| state.uncertainty = uncertainty);
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ManualState) -> R) -> R {
        // The state is two plain values, so a poisoned lock is still usable.
        let mut guard = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<Interval, ValidationError> {
        self.with_state(|state| Interval::around(state.now, state.uncertainty))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Result<Interval, ValidationError> {
        (**self).now()
    }
}

/// A clock built from configuration.
///
/// The manual variant keeps its [`ManualClock`] reachable so callers can
/// drive it after construction.
#[derive(Debug, Clone)]
pub enum ConfiguredClock {
    /// Wall clock.
    System(SystemClock),
    /// Manually driven clock, shared with whoever moves it.
    Manual(Arc<ManualClock>),
}

impl ConfiguredClock {
    /// The manual clock, if this is one.
    #[must_use]
    pub fn manual(&self) -> Option<&Arc<ManualClock>> {
        match self {
            Self::System(_) => None,
            Self::Manual(clock) => Some(clock),
        }
    }
}

impl Clock for ConfiguredClock {
    fn now(&self) -> Result<Interval, ValidationError> {
        match self {
            Self::System(clock) => clock.now(),
            Self::Manual(clock) => clock.now(),
        }
    }
}

/// Builds the clock selected by `config`.
#[must_use]
pub fn clock_from_config(config: &ClockConfig) -> ConfiguredClock {
    let millis = i64::try_from(config.uncertainty_ms).unwrap_or(i64::MAX);
    let uncertainty = Duration::try_milliseconds(millis).unwrap_or(Duration::MAX);
    match config.kind {
        ClockKind::System => ConfiguredClock::System(SystemClock::new(uncertainty)),
        ClockKind::Manual => {
            let clock = ManualClock::new();
            clock.set_uncertainty(uncertainty);
            ConfiguredClock::Manual(Arc::new(clock))
        }
    }
}
