//! WorldClockAPI time source.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use certwatch_common::Timestamp;

use super::{get_json, SourceResult, SourceUnavailable, TimeSource};

/// Time source backed by worldclockapi.com.
///
/// The `currentDateTime` field is ISO-8601, usually UTC with a trailing `Z`
/// marker and minute or sub-second precision, e.g. `2023-04-17T12:34Z` or
/// `2023-04-17T12:34:56.789Z`. A `Z` is interpreted as UTC; without one the
/// value is taken as returned and left untagged.
#[derive(Debug, Clone)]
pub struct WorldClockSource {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
struct WorldClockBody {
    #[serde(rename = "currentDateTime")]
    current_date_time: String,
}

impl WorldClockSource {
    pub const DEFAULT_ENDPOINT: &'static str = "http://worldclockapi.com/api/json/utc/now";

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
impl TimeSource for WorldClockSource {
    fn name(&self) -> &'static str {
        "worldclock"
    }

    async fn fetch(&self) -> SourceResult {
        let body: WorldClockBody = match get_json(self.client.get(&self.endpoint)).await {
            Ok(body) => body,
            Err(unavailable) => return SourceResult::Unavailable(unavailable),
        };

        match parse_current_datetime(&body.current_date_time) {
            Some(timestamp) => SourceResult::Resolved(timestamp),
            None => SourceResult::Unavailable(SourceUnavailable::Malformed(format!(
                "bad datetime {:?}",
                body.current_date_time
            ))),
        }
    }
}

/// Parse the `currentDateTime` value into a frame-tagged timestamp.
fn parse_current_datetime(raw: &str) -> Option<Timestamp> {
    if let Some(stripped) = raw.strip_suffix('Z') {
        let naive = parse_naive_iso(stripped)?;
        return Some(Timestamp::Zoned(Utc.from_utc_datetime(&naive).fixed_offset()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Timestamp::Zoned(dt));
    }
    parse_naive_iso(raw).map(Timestamp::Naive)
}

/// ISO-8601 without an offset, with or without seconds and fractions.
fn parse_naive_iso(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_utc_with_z_marker() {
        let parsed = parse_current_datetime("2023-04-17T12:34Z").unwrap();
        let expected = Utc.from_utc_datetime(&naive(2023, 4, 17, 12, 34, 0)).fixed_offset();
        assert_eq!(parsed, Timestamp::Zoned(expected));
    }

    #[test]
    fn test_parse_z_marker_with_fractional_seconds() {
        let parsed = parse_current_datetime("2023-04-17T12:34:56.789Z").unwrap();
        let expected = Utc
            .from_utc_datetime(&(naive(2023, 4, 17, 12, 34, 56) + chrono::Duration::milliseconds(789)))
            .fixed_offset();
        assert_eq!(parsed, Timestamp::Zoned(expected));
    }

    #[test]
    fn test_parse_explicit_offset() {
        let parsed = parse_current_datetime("2023-04-17T12:34:56+02:00").unwrap();
        assert!(matches!(parsed, Timestamp::Zoned(_)));
    }

    #[test]
    fn test_parse_without_zone_stays_naive() {
        let parsed = parse_current_datetime("2023-04-17T12:34:56").unwrap();
        assert_eq!(parsed, Timestamp::Naive(naive(2023, 4, 17, 12, 34, 56)));
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_current_datetime("soonish").is_none());
    }

    #[tokio::test]
    async fn test_fetch_resolves_via_mock() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/json/utc/now"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "currentDateTime": "2023-04-17T12:34Z",
                "dayOfTheWeek": "Monday"
            })))
            .mount(&server)
            .await;

        let source = WorldClockSource::with_endpoint(
            Client::new(),
            format!("{}/api/json/utc/now", server.uri()),
        );
        let result = source.fetch().await;
        assert!(matches!(
            result,
            SourceResult::Resolved(Timestamp::Zoned(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_missing_field_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/json/utc/now"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ordinalDate": "2023-107"})))
            .mount(&server)
            .await;

        let source = WorldClockSource::with_endpoint(
            Client::new(),
            format!("{}/api/json/utc/now", server.uri()),
        );
        let result = source.fetch().await;
        assert!(matches!(
            result,
            SourceResult::Unavailable(SourceUnavailable::Malformed(_))
        ));
    }
}
