//! Order service wire models.

use serde::Deserialize;

/// Response envelope wrapped around every order service payload.
///
/// A missing `isOk` counts as not-ok and a missing `isError` counts as an
/// error, so an unrecognized body is rejected rather than trusted.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(rename = "isOk", default)]
    pub is_ok: bool,
    #[serde(rename = "isError", default = "default_true")]
    pub is_error: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_true() -> bool {
    true
}

/// A certificate order as returned by the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: String,
    /// User-configured identifier selecting which order to act on.
    #[serde(default)]
    pub mark: String,
    /// Expiry in `YYYY-MM-DD HH:MM:SS` wall-clock format.
    pub time_end: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderList {
    #[serde(default)]
    pub list: Vec<Order>,
}

/// Reference to the renewed order.
#[derive(Debug, Deserialize)]
pub(crate) struct RenewReceipt {
    pub id: String,
}

/// Downloaded certificate artifacts, plaintext PEM.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateBundle {
    pub cert: String,
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_missing_flags_counts_as_error() {
        let envelope: Envelope<OrderList> = serde_json::from_str("{}").unwrap();
        assert!(!envelope.is_ok);
        assert!(envelope.is_error);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_order_with_minimal_fields() {
        let order: Order =
            serde_json::from_str(r#"{"id": "42", "time_end": "2024-06-01 00:00:00"}"#).unwrap();
        assert_eq!(order.id, "42");
        assert_eq!(order.mark, "");
        assert!(order.domains.is_empty());
    }
}
