use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// A simple clock abstraction for deterministic time in services and tests.
///
/// Calendar days are taken in the user's local time zone: the system's
/// for the default clock, an explicit offset for a fixed one.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed {
        at: DateTime<Utc>,
        offset: FixedOffset,
    },
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp, with days counted in UTC.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::fixed_at_offset(at, Utc.fix())
    }

    /// Returns a clock fixed at the given timestamp for a user at `offset`.
    #[must_use]
    pub fn fixed_at_offset(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::Fixed { at, offset }
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed { at, .. } => *at,
        }
    }

    /// The user's calendar day at `now()`.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::Default => Local::now().date_naive(),
            Clock::Fixed { at, offset } => at.with_timezone(offset).date_naive(),
        }
    }
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
