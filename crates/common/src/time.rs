//! Timestamp frames and expiry arithmetic
//!
//! Network time sources report either zone-tagged instants (ISO-8601 with an
//! offset) or bare wall-clock datetimes with no zone at all. Order expiry
//! timestamps are always naive wall-clock strings. [`Timestamp`] keeps the
//! two frames apart so that a comparison only ever happens after both sides
//! have been projected into the same frame; [`remaining_until`] owns that
//! projection, the caller never does.
//!
//! # Truncation semantics
//!
//! Deltas are truncated to whole seconds and decomposed with **floor
//! division** (`div_euclid`): the day count rounds toward negative infinity
//! and the hour/minute/second remainder is always non-negative. An expired
//! order therefore shows up as e.g. `days = -9, hours = 0, minutes = 0`,
//! and `days*86400 + hours*3600 + minutes*60 + seconds` reconstructs the
//! signed total exactly.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed format used by order expiry timestamps (naive, no timezone).
pub const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_MINUTE: i64 = 60;

/// An absolute point in time, tagged with what is known about its frame.
///
/// `Zoned` carries a UTC offset and can be converted losslessly; `Naive` is
/// a bare wall-clock reading whose zone the reporting service never stated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    /// Instant with a known UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// Wall-clock datetime with no zone information.
    Naive(NaiveDateTime),
}

impl Timestamp {
    /// Current local system time as a naive wall-clock reading.
    ///
    /// This is the fallback frame used when no network source answers.
    pub fn now_local() -> Self {
        Timestamp::Naive(Local::now().naive_local())
    }

    /// Project this timestamp into the local naive frame.
    ///
    /// Zone-tagged instants are converted to local wall-clock time and the
    /// tag is dropped; naive readings pass through unchanged.
    pub fn to_local_naive(&self) -> NaiveDateTime {
        match self {
            Timestamp::Zoned(dt) => dt.with_timezone(&Local).naive_local(),
            Timestamp::Naive(dt) => *dt,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
            Timestamp::Naive(dt) => write!(f, "{}", dt.format(EXPIRY_FORMAT)),
        }
    }
}

/// Signed time remaining until an expiry, decomposed for display.
///
/// `days` carries the sign (floor division, see the module docs); `hours`,
/// `minutes` and `seconds` are the non-negative remainder of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingTime {
    pub days: i64,
    /// 0..=23
    pub hours: u32,
    /// 0..=59
    pub minutes: u32,
    /// 0..=59
    pub seconds: u32,
}

impl RemainingTime {
    /// Decompose a signed whole-second delta.
    pub fn from_delta_seconds(total: i64) -> Self {
        let days = total.div_euclid(SECS_PER_DAY);
        let rem = total.rem_euclid(SECS_PER_DAY);
        Self {
            days,
            hours: (rem / SECS_PER_HOUR) as u32,
            minutes: (rem % SECS_PER_HOUR / SECS_PER_MINUTE) as u32,
            seconds: (rem % SECS_PER_MINUTE) as u32,
        }
    }

    /// Reconstruct the signed total this breakdown was derived from.
    pub fn total_seconds(&self) -> i64 {
        self.days * SECS_PER_DAY
            + i64::from(self.hours) * SECS_PER_HOUR
            + i64::from(self.minutes) * SECS_PER_MINUTE
            + i64::from(self.seconds)
    }

    /// Whether the expiry lies in the past.
    pub fn is_expired(&self) -> bool {
        self.total_seconds() < 0
    }
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Malformed expiry timestamp.
#[derive(Debug, Error)]
#[error("invalid expiry timestamp {value:?}: expected `YYYY-MM-DD HH:MM:SS`")]
pub struct ExpiryParseError {
    /// The offending input.
    pub value: String,
    #[source]
    source: chrono::ParseError,
}

/// Compute the signed time remaining from `now` until `expiry`.
///
/// `expiry` must match [`EXPIRY_FORMAT`]; `now` is projected into the same
/// naive local frame before subtraction. Pure function, no clock access.
///
/// # Errors
///
/// Returns [`ExpiryParseError`] if `expiry` does not match the format.
pub fn remaining_until(expiry: &str, now: &Timestamp) -> Result<RemainingTime, ExpiryParseError> {
    let expiry_dt =
        NaiveDateTime::parse_from_str(expiry, EXPIRY_FORMAT).map_err(|source| ExpiryParseError {
            value: expiry.to_string(),
            source,
        })?;

    let delta = expiry_dt.signed_duration_since(now.to_local_naive());
    Ok(RemainingTime::from_delta_seconds(delta.num_seconds()))
}
