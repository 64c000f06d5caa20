//! Time resolution race
//!
//! Races every configured time source concurrently under a bounded deadline
//! and adopts the first success. The sources are third-party endpoints that
//! may hang, fail or answer slowly, so the resolver exploits whichever one
//! answers fastest instead of querying them in sequence, and degrades to the
//! local system clock rather than blocking: resolution can lose precision
//! but it cannot fail.
//!
//! # Race semantics
//!
//! - All sources are spawned concurrently per call; no unit outlives the
//!   resolution in any way the caller can observe.
//! - No ordering is promised among sources. The adopted result is whichever
//!   completes first in wall-clock order, and exactly one result is adopted.
//! - Cancellation of the losers is advisory. An in-flight request may run on
//!   in the background after adoption, but its result is discarded and the
//!   caller never waits on it.
//! - Two independent timers bound the race: each source's own hard call
//!   timeout and the race-wide deadline here. The shorter effective bound
//!   wins.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use certwatch_common::Timestamp;

use crate::timesource::{SourceResult, TimeSource};

/// Default race-wide deadline, matching the per-source call timeout.
pub const DEFAULT_RACE_DEADLINE: Duration = Duration::from_secs(5);

/// Where a resolved timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrigin {
    /// Adopted from the named network source.
    Source(&'static str),
    /// No source answered in time; local system clock.
    LocalFallback,
}

impl TimeOrigin {
    pub fn is_fallback(&self) -> bool {
        matches!(self, TimeOrigin::LocalFallback)
    }
}

impl fmt::Display for TimeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOrigin::Source(name) => f.write_str(name),
            TimeOrigin::LocalFallback => f.write_str("local"),
        }
    }
}

/// Result of one resolution race.
#[derive(Debug, Clone)]
pub struct RaceOutcome {
    pub timestamp: Timestamp,
    pub origin: TimeOrigin,
}

impl RaceOutcome {
    fn local_fallback() -> Self {
        Self {
            timestamp: Timestamp::now_local(),
            origin: TimeOrigin::LocalFallback,
        }
    }
}

/// Races time sources and adopts the first success.
#[derive(Debug, Clone)]
pub struct TimeResolver {
    deadline: Duration,
}

impl TimeResolver {
    pub fn new() -> Self {
        Self {
            deadline: DEFAULT_RACE_DEADLINE,
        }
    }

    /// Override the race-wide deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Race `sources` and return the adopted timestamp.
    ///
    /// Returns as soon as the first source resolves; failing and slower
    /// sources are not waited for. If nothing resolves within the deadline,
    /// or every source reports unavailable before it, the local system
    /// clock is returned, tagged [`TimeOrigin::LocalFallback`]. Individual
    /// source failures are logged at debug level and absorbed; this method
    /// has no error path.
    pub async fn resolve(&self, sources: Vec<Arc<dyn TimeSource>>) -> RaceOutcome {
        if sources.is_empty() {
            warn!("No time sources configured, using local clock");
            return RaceOutcome::local_fallback();
        }

        let mut in_flight = JoinSet::new();
        for source in sources {
            in_flight.spawn(async move {
                let result = source.fetch().await;
                (source.name(), result)
            });
        }

        let adopted = tokio::time::timeout(self.deadline, first_success(&mut in_flight)).await;
        // Advisory cancellation of whatever is still running.
        in_flight.abort_all();

        match adopted {
            Ok(Some((name, timestamp))) => {
                info!(source = name, time = %timestamp, "Resolved network time");
                RaceOutcome {
                    timestamp,
                    origin: TimeOrigin::Source(name),
                }
            }
            Ok(None) => {
                warn!("All time sources unavailable, falling back to local clock");
                RaceOutcome::local_fallback()
            }
            Err(_) => {
                warn!(
                    deadline_secs = self.deadline.as_secs(),
                    "Time race deadline elapsed, falling back to local clock"
                );
                RaceOutcome::local_fallback()
            }
        }
    }
}

impl Default for TimeResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume completions until the first success.
///
/// This single consumer of the completion stream is the adoption point:
/// only one result can ever be returned from here, so two sources finishing
/// within microseconds of each other cannot both win. A panicked source
/// task surfaces as a join error and counts as unavailable.
async fn first_success(
    in_flight: &mut JoinSet<(&'static str, SourceResult)>,
) -> Option<(&'static str, Timestamp)> {
    while let Some(joined) = in_flight.join_next().await {
        match joined {
            Ok((name, SourceResult::Resolved(timestamp))) => return Some((name, timestamp)),
            Ok((name, SourceResult::Unavailable(reason))) => {
                debug!(source = name, reason = %reason, "Time source unavailable");
            }
            Err(err) => {
                debug!(error = %err, "Time source task failed");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timesource::SourceUnavailable;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::time::Instant;

    fn stamp(second: u32) -> Timestamp {
        Timestamp::Naive(
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, second)
                .unwrap(),
        )
    }

    struct StaticSource {
        name: &'static str,
        timestamp: Timestamp,
        delay: Option<Duration>,
    }

    impl StaticSource {
        fn instant(name: &'static str, timestamp: Timestamp) -> Self {
            Self {
                name,
                timestamp,
                delay: None,
            }
        }

        fn delayed(name: &'static str, timestamp: Timestamp, delay: Duration) -> Self {
            Self {
                name,
                timestamp,
                delay: Some(delay),
            }
        }
    }

    #[async_trait]
    impl TimeSource for StaticSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch(&self) -> SourceResult {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            SourceResult::Resolved(self.timestamp)
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TimeSource for FailingSource {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(&self) -> SourceResult {
            SourceResult::Unavailable(SourceUnavailable::Status(503))
        }
    }

    struct HangingSource;

    #[async_trait]
    impl TimeSource for HangingSource {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn fetch(&self) -> SourceResult {
            std::future::pending().await
        }
    }

    struct PanickingSource;

    #[async_trait]
    impl TimeSource for PanickingSource {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn fetch(&self) -> SourceResult {
            panic!("source blew up");
        }
    }

    #[tokio::test]
    async fn test_first_success_is_adopted_with_name() {
        let resolver = TimeResolver::new();
        let outcome = resolver
            .resolve(vec![Arc::new(StaticSource::instant("only", stamp(1)))])
            .await;
        assert_eq!(outcome.origin, TimeOrigin::Source("only"));
        assert_eq!(outcome.timestamp, stamp(1));
    }

    #[tokio::test]
    async fn test_fast_success_does_not_wait_for_hanging_peer() {
        let resolver = TimeResolver::new();
        let started = Instant::now();
        let outcome = resolver
            .resolve(vec![
                Arc::new(HangingSource),
                Arc::new(StaticSource::delayed(
                    "fast",
                    stamp(2),
                    Duration::from_millis(10),
                )),
            ])
            .await;
        assert_eq!(outcome.origin, TimeOrigin::Source("fast"));
        // Bounded by the fastest success, not the 5s deadline.
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failures_are_absorbed_until_a_success() {
        let resolver = TimeResolver::new();
        let outcome = resolver
            .resolve(vec![
                Arc::new(FailingSource),
                Arc::new(FailingSource),
                Arc::new(StaticSource::delayed(
                    "slowish",
                    stamp(3),
                    Duration::from_millis(20),
                )),
            ])
            .await;
        assert_eq!(outcome.origin, TimeOrigin::Source("slowish"));
    }

    #[tokio::test]
    async fn test_all_unavailable_falls_back_without_waiting_for_deadline() {
        let resolver = TimeResolver::new();
        let started = Instant::now();
        let outcome = resolver
            .resolve(vec![Arc::new(FailingSource), Arc::new(FailingSource)])
            .await;
        assert!(outcome.origin.is_fallback());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_deadline_elapses_with_hanging_sources() {
        let resolver = TimeResolver::new().with_deadline(Duration::from_millis(50));
        let started = Instant::now();
        let outcome = resolver
            .resolve(vec![Arc::new(HangingSource), Arc::new(HangingSource)])
            .await;
        assert!(outcome.origin.is_fallback());
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_panicking_source_does_not_poison_the_race() {
        let resolver = TimeResolver::new();
        let outcome = resolver
            .resolve(vec![
                Arc::new(PanickingSource),
                Arc::new(StaticSource::delayed(
                    "survivor",
                    stamp(4),
                    Duration::from_millis(10),
                )),
            ])
            .await;
        assert_eq!(outcome.origin, TimeOrigin::Source("survivor"));
    }

    #[tokio::test]
    async fn test_no_sources_falls_back() {
        let resolver = TimeResolver::new();
        let outcome = resolver.resolve(Vec::new()).await;
        assert!(outcome.origin.is_fallback());
    }

    #[tokio::test]
    async fn test_simultaneous_successes_adopt_exactly_one() {
        let resolver = TimeResolver::new();
        for _ in 0..100 {
            let outcome = resolver
                .resolve(vec![
                    Arc::new(StaticSource::instant("a", stamp(10))),
                    Arc::new(StaticSource::instant("b", stamp(20))),
                ])
                .await;
            // Whichever won, the adopted timestamp must belong to the winner.
            match outcome.origin {
                TimeOrigin::Source("a") => assert_eq!(outcome.timestamp, stamp(10)),
                TimeOrigin::Source("b") => assert_eq!(outcome.timestamp, stamp(20)),
                other => panic!("unexpected origin {other:?}"),
            }
        }
    }
}
