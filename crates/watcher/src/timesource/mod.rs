//! Network time source capability
//!
//! A time source is one external service that can answer "what time is it
//! right now". The watcher treats these endpoints as third-party services of
//! unguaranteed reliability: each implementation issues a single HTTP GET
//! with a hard per-call timeout and collapses every failure (network error,
//! timeout, unexpected status, malformed body, missing field) into
//! [`SourceResult::Unavailable`]. `fetch` never panics and never hands a
//! transport error to the race loop.
//!
//! # Implementations
//!
//! - [`WorldTimeSource`] - worldtimeapi.org, ISO-8601 with offset
//! - [`WorldClockSource`] - worldclockapi.com, UTC with a trailing `Z`
//! - [`ApiHzSource`] - cn.apihz.cn, credentialed, naive wall-clock format

mod apihz;
mod worldclock;
mod worldtime;

pub use apihz::ApiHzSource;
pub use worldclock::WorldClockSource;
pub use worldtime::WorldTimeSource;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use certwatch_common::Timestamp;

/// Hard per-call timeout for a single source request.
///
/// Independent of the race deadline; whichever bound fires first wins.
pub const SOURCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single fetch.
///
/// No partial state: a source either produced a usable timestamp or it did
/// not.
#[derive(Debug, Clone)]
pub enum SourceResult {
    Resolved(Timestamp),
    Unavailable(SourceUnavailable),
}

/// Why a source failed to produce a timestamp.
///
/// Carried for debug logging only; the race treats every variant the same.
#[derive(Debug, Clone, Error)]
pub enum SourceUnavailable {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status: {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// One external time-providing endpoint.
#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Short stable name used in logs and the race outcome.
    fn name(&self) -> &'static str;

    /// Fetch the current time, one attempt, no retries.
    ///
    /// All failures collapse to [`SourceResult::Unavailable`].
    async fn fetch(&self) -> SourceResult;
}

/// Build the HTTP client shared by the stock sources, with the per-call
/// timeout baked in.
pub fn source_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(SOURCE_TIMEOUT).build()
}

/// Issue the request and decode a JSON body, mapping each failure mode onto
/// its [`SourceUnavailable`] variant. Shared by the stock sources.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SourceUnavailable> {
    let response = request
        .send()
        .await
        .map_err(|err| SourceUnavailable::Request(err.to_string()))?;

    if response.status() != StatusCode::OK {
        return Err(SourceUnavailable::Status(response.status().as_u16()));
    }

    response
        .json()
        .await
        .map_err(|err| SourceUnavailable::Malformed(err.to_string()))
}
