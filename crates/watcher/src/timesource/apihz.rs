//! apihz time source.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use certwatch_common::Timestamp;

use super::{get_json, SourceResult, SourceUnavailable, TimeSource};

/// Wall-clock format used by the apihz `msg` field (naive, no timezone).
const APIHZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Success sentinel in the apihz `code` field.
const SUCCESS_CODE: i64 = 200;

/// Time source backed by cn.apihz.cn.
///
/// The only credentialed source: the caller id and key travel as query
/// parameters. A successful body looks like
/// `{ "code": 200, "msg": "2024-11-12 13:14:15" }`; the timestamp is naive
/// wall-clock with no timezone.
#[derive(Debug, Clone)]
pub struct ApiHzSource {
    client: Client,
    endpoint: String,
    id: String,
    key: String,
}

#[derive(Deserialize)]
struct ApiHzBody {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
}

impl ApiHzSource {
    pub const DEFAULT_ENDPOINT: &'static str = "https://cn.apihz.cn/api/time/getapi.php";

    pub fn new(client: Client, id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::with_endpoint(client, Self::DEFAULT_ENDPOINT, id, key)
    }

    /// Override the endpoint; tests point this at a mock server.
    pub fn with_endpoint(
        client: Client,
        endpoint: impl Into<String>,
        id: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            id: id.into(),
            key: key.into(),
        }
    }
}

#[async_trait]
impl TimeSource for ApiHzSource {
    fn name(&self) -> &'static str {
        "apihz"
    }

    async fn fetch(&self) -> SourceResult {
        let request = self.client.get(&self.endpoint).query(&[
            ("id", self.id.as_str()),
            ("key", self.key.as_str()),
            ("type", "2"),
        ]);
        let body: ApiHzBody = match get_json(request).await {
            Ok(body) => body,
            Err(unavailable) => return SourceResult::Unavailable(unavailable),
        };

        if body.code != Some(SUCCESS_CODE) {
            return SourceResult::Unavailable(SourceUnavailable::Malformed(format!(
                "success code missing, got {:?}",
                body.code
            )));
        }
        let Some(msg) = body.msg else {
            return SourceResult::Unavailable(SourceUnavailable::Malformed(
                "msg field missing".to_string(),
            ));
        };

        match NaiveDateTime::parse_from_str(&msg, APIHZ_FORMAT) {
            Ok(dt) => SourceResult::Resolved(Timestamp::Naive(dt)),
            Err(err) => SourceResult::Unavailable(SourceUnavailable::Malformed(format!(
                "bad datetime {msg:?}: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> ApiHzSource {
        ApiHzSource::with_endpoint(
            Client::new(),
            format!("{}/api/time/getapi.php", server.uri()),
            "11111111",
            "22222222",
        )
    }

    #[tokio::test]
    async fn test_resolves_naive_timestamp_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/time/getapi.php"))
            .and(query_param("id", "11111111"))
            .and(query_param("key", "22222222"))
            .and(query_param("type", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "msg": "2024-11-12 13:14:15"
            })))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch().await;
        let expected = NaiveDate::from_ymd_opt(2024, 11, 12)
            .unwrap()
            .and_hms_opt(13, 14, 15)
            .unwrap();
        match result {
            SourceResult::Resolved(Timestamp::Naive(dt)) => assert_eq!(dt, expected),
            other => panic!("expected resolved naive timestamp, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_success_code_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/time/getapi.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "msg": "2024-11-12 13:14:15"
            })))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch().await;
        assert!(matches!(
            result,
            SourceResult::Unavailable(SourceUnavailable::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_error_code_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/time/getapi.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 400,
                "msg": "id or key invalid"
            })))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch().await;
        assert!(matches!(
            result,
            SourceResult::Unavailable(SourceUnavailable::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unexpected_msg_format_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/time/getapi.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": 200,
                "msg": "2024-11-12T13:14:15Z"
            })))
            .mount(&server)
            .await;

        let result = source_for(&server).fetch().await;
        assert!(matches!(
            result,
            SourceResult::Unavailable(SourceUnavailable::Malformed(_))
        ));
    }
}
