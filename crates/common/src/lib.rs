//! Certwatch common types
//!
//! Shared building blocks for the certwatch watcher: the [`Timestamp`] frame
//! model and the expiry arithmetic that turns a signed time delta into a
//! days/hours/minutes/seconds breakdown.

pub mod time;

pub use time::{remaining_until, ExpiryParseError, RemainingTime, Timestamp, EXPIRY_FORMAT};
