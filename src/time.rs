//! Uncertain instants.
//!
//! A reading from a [`Clock`](crate::Clock) is not a single instant but an
//! [`Interval`] `[earliest, latest]` that contains the true time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A closed time interval `[earliest, latest]`.
///
/// # Examples
///
/// ```
/// use typebus::Interval;
/// use chrono::{Duration, Utc};
///
/// let now = Utc::now();
/// let reading = Interval::new(now, now + Duration::milliseconds(10)).unwrap();
/// assert!(reading.contains(now));
///
/// // A zero-width interval is a valid reading.
/// assert!(Interval::new(now, now).is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
}

impl Interval {
    /// Creates an interval.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidInterval` if `latest < earliest`.
    pub fn new(earliest: DateTime<Utc>, latest: DateTime<Utc>) -> Result<Self, ValidationError> {
        if latest < earliest {
            return Err(ValidationError::InvalidInterval { earliest, latest });
        }
        Ok(Self { earliest, latest })
    }

    /// Creates the interval `[at - uncertainty, at + uncertainty]`, clamped to
    /// the representable range.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidInterval` if `uncertainty` is negative.
    pub fn around(at: DateTime<Utc>, uncertainty: Duration) -> Result<Self, ValidationError> {
        if uncertainty < Duration::zero() {
            return Err(ValidationError::InvalidInterval {
                earliest: at.checked_sub_signed(uncertainty).unwrap_or(DateTime::<Utc>::MAX_UTC),
                latest: at.checked_add_signed(uncertainty).unwrap_or(DateTime::<Utc>::MIN_UTC),
            });
        }
        let earliest = at
            .checked_sub_signed(uncertainty)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let latest = at
            .checked_add_signed(uncertainty)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(earliest, latest)
    }

    /// Lower bound of the interval.
    #[must_use]
    pub const fn earliest(&self) -> DateTime<Utc> {
        self.earliest
    }

    /// Upper bound of the interval.
    #[must_use]
    pub const fn latest(&self) -> DateTime<Utc> {
        self.latest
    }

    /// Returns true if this interval ends strictly before `other` starts.
    ///
    /// Touching intervals (`self.latest == other.earliest`) are not ordered.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.latest < other.earliest
    }

    /// Returns true if `earliest <= latest`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.earliest <= self.latest
    }

    /// Half the width of the interval.
    #[must_use]
    pub fn uncertainty(&self) -> Duration {
        (self.latest - self.earliest) / 2
    }

    /// Check if an instant falls within `[earliest, latest]`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.earliest && instant <= self.latest
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} → {}]", self.earliest, self.latest)
    }
}
