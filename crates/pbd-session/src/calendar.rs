//! Session calendar: reference-zone localization + phase classification.
//!
//! # Phases (reference-zone wall clock)
//!
//! - [`Phase::Premarket`]: `[04:00, 09:30)`
//! - [`Phase::MarketHours`]: `[09:30, 16:00]` (the 16:00 bar itself is still
//!   market hours)
//! - [`Phase::AfterHours`]: everything else, including `[00:00, 04:00)`
//!
//! # Naive timestamps
//!
//! A timestamp without zone information is interpreted as **UTC** before it is
//! converted into the reference zone. Feeds that emit local-naive timestamps
//! will be classified wrongly; upstream data must be UTC or zone-qualified.

use std::fmt;

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

// ---------------------------------------------------------------------------
// Session boundaries (seconds from local midnight)
// ---------------------------------------------------------------------------

/// 04:00:00 local.
pub const PREMARKET_OPEN_SECS: u32 = 4 * 3600;
/// 09:30:00 local.
pub const MARKET_OPEN_SECS: u32 = 9 * 3600 + 30 * 60;
/// 16:00:00 local (inclusive end of market hours).
pub const MARKET_CLOSE_SECS: u32 = 16 * 3600;

/// Default reference zone name (US equities).
pub const DEFAULT_TZ_NAME: &str = "America/New_York";

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// An instant as delivered by a bar source: either zone-qualified or naive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Timestamp {
    /// Instant with an attached UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// Wall-clock value with no zone information (treated as UTC).
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// The UTC instant this timestamp denotes under the naive-is-UTC rule.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Timestamp::Zoned(dt) => dt.with_timezone(&Utc),
            Timestamp::Naive(n) => Utc.from_utc_datetime(n),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Zoned(dt.into())
    }
}

impl From<DateTime<FixedOffset>> for Timestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Timestamp::Zoned(dt)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(n: NaiveDateTime) -> Self {
        Timestamp::Naive(n)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
            Timestamp::Naive(n) => write!(f, "{}", n.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Trading-calendar phase of a local wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Premarket,
    MarketHours,
    AfterHours,
}

impl Phase {
    /// Classify a local time of day, given as seconds from midnight plus the
    /// sub-second remainder in nanoseconds.
    ///
    /// Sub-second precision matters only at the 16:00 boundary: `16:00:00.0`
    /// is market hours, `16:00:00.5` is not.
    pub fn classify(secs_from_midnight: u32, nanos: u32) -> Phase {
        let t = (secs_from_midnight, nanos);
        if t >= (PREMARKET_OPEN_SECS, 0) && t < (MARKET_OPEN_SECS, 0) {
            Phase::Premarket
        } else if t >= (MARKET_OPEN_SECS, 0) && t <= (MARKET_CLOSE_SECS, 0) {
            Phase::MarketHours
        } else {
            Phase::AfterHours
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Premarket => "PREMARKET",
            Phase::MarketHours => "MARKET_HOURS",
            Phase::AfterHours => "AFTER_HOURS",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// The zone name is not in the IANA database shipped with chrono-tz.
    UnknownTimezone { name: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UnknownTimezone { name } => {
                write!(f, "unknown timezone: '{}'", name)
            }
        }
    }
}

impl std::error::Error for SessionError {}

// ---------------------------------------------------------------------------
// SessionClock
// ---------------------------------------------------------------------------

/// Converts bar timestamps into the exchange's local wall clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionClock {
    tz: Tz,
}

impl SessionClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// NYSE / Nasdaq reference clock.
    pub fn new_york() -> Self {
        Self::new(chrono_tz::America::New_York)
    }

    /// Build a clock from an IANA zone name (e.g. `"America/Chicago"`).
    pub fn from_tz_name(name: &str) -> Result<Self, SessionError> {
        let name = name.trim();
        name.parse::<Tz>()
            .map(Self::new)
            .map_err(|_| SessionError::UnknownTimezone {
                name: name.to_string(),
            })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn localize(&self, ts: &Timestamp) -> SessionInstant {
        self.localize_utc(ts.to_utc())
    }

    pub fn localize_utc(&self, ts: DateTime<Utc>) -> SessionInstant {
        SessionInstant {
            local: ts.with_timezone(&self.tz),
        }
    }

    pub fn localize_fixed(&self, ts: DateTime<FixedOffset>) -> SessionInstant {
        SessionInstant {
            local: ts.with_timezone(&self.tz),
        }
    }

    /// Naive values are taken as UTC (see module docs).
    pub fn localize_naive(&self, ts: NaiveDateTime) -> SessionInstant {
        self.localize_utc(Utc.from_utc_datetime(&ts))
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new_york()
    }
}

// ---------------------------------------------------------------------------
// SessionInstant
// ---------------------------------------------------------------------------

/// A bar instant expressed in the reference zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionInstant {
    local: DateTime<Tz>,
}

impl SessionInstant {
    pub fn local(&self) -> DateTime<Tz> {
        self.local
    }

    pub fn phase(&self) -> Phase {
        Phase::classify(self.local.num_seconds_from_midnight(), self.local.nanosecond())
    }

    /// Reference-zone calendar date; drives the per-symbol daily reset.
    pub fn trading_date(&self) -> NaiveDate {
        self.local.date_naive()
    }

    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    pub fn minute(&self) -> u32 {
        self.local.minute()
    }

    /// Minutes elapsed since 09:30 local, from (hour, minute) components only.
    ///
    /// Negative before the open. Not derived from a duration, so a DST jump in
    /// the source data cannot skew it.
    pub fn minutes_since_open(&self) -> i64 {
        (self.hour() as i64 - 9) * 60 + (self.minute() as i64 - 30)
    }

    /// `true` if the local time of day is at or after `hour:minute`.
    pub fn is_at_or_after(&self, hour: u32, minute: u32) -> bool {
        let t = (self.local.num_seconds_from_midnight(), self.local.nanosecond());
        t >= (hour * 3600 + minute * 60, 0)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
