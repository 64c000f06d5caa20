//! WorldTimeAPI time source.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;

use certwatch_common::Timestamp;

use super::{get_json, SourceResult, SourceUnavailable, TimeSource};

/// Time source backed by worldtimeapi.org.
///
/// The endpoint reports the caller's current time in a `datetime` field as
/// ISO-8601 with an offset, e.g. `2023-04-17T12:34:56.789123+00:00`.
#[derive(Debug, Clone)]
pub struct WorldTimeSource {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct WorldTimeBody {
    datetime: String,
}

impl WorldTimeSource {
    pub const DEFAULT_ENDPOINT: &'static str = "http://worldtimeapi.org/api/ip";

    pub fn new(client: Client) -> Self {
        Self::with_endpoint(client, Self::DEFAULT_ENDPOINT)
    }

    /// Override the endpoint; tests point this at a mock server.
    pub fn with_endpoint(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl TimeSource for WorldTimeSource {
    fn name(&self) -> &'static str {
        "worldtime"
    }

    async fn fetch(&self) -> SourceResult {
        let body: WorldTimeBody = match get_json(self.client.get(&self.endpoint)).await {
            Ok(body) => body,
            Err(unavailable) => return SourceResult::Unavailable(unavailable),
        };

        match DateTime::parse_from_rfc3339(&body.datetime) {
            Ok(dt) => SourceResult::Resolved(Timestamp::Zoned(dt)),
            Err(err) => SourceResult::Unavailable(SourceUnavailable::Malformed(format!(
                "bad datetime {:?}: {err}",
                body.datetime
            ))),
        }
    }
}
