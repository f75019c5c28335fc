use std::sync::Arc;

use serde_json::Value;

use crate::modules::http::{ApiRequest, RequestClient};
use crate::shared::constants::{MAX_QUALITY, MIN_QUALITY, PUBLIC_CONFIG_PATH};

/// Reads the admin-configured compression ceiling
pub struct QualityService {
    client: Arc<dyn RequestClient>,
}

impl QualityService {
    pub fn new(client: Arc<dyn RequestClient>) -> Self {
        Self { client }
    }

    /// Current quality ceiling; full quality when it cannot be determined
    pub async fn fetch_ceiling(&self) -> u8 {
        let response = match self
            .client
            .send(ApiRequest::get(PUBLIC_CONFIG_PATH), None)
            .await
        {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    "Public config request failed: HTTP {}, assuming quality ceiling {}",
                    response.status,
                    MAX_QUALITY
                );
                return MAX_QUALITY;
            }
            Err(e) => {
                tracing::warn!(
                    "Public config request failed: {}, assuming quality ceiling {}",
                    e,
                    MAX_QUALITY
                );
                return MAX_QUALITY;
            }
        };

        let ceiling = parse_ceiling(response.body.get("compress_quality"));
        tracing::debug!("Quality ceiling is {}", ceiling);
        ceiling
    }
}

/// The server stores config values as strings; accept numbers too
fn parse_ceiling(value: Option<&Value>) -> u8 {
    let parsed = match value {
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    };

    match parsed {
        Some(q) if q > 0 => q.clamp(MIN_QUALITY as i64, MAX_QUALITY as i64) as u8,
        _ => MAX_QUALITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::FakeRequestClient;
    use serde_json::json;

    #[test]
    fn test_parse_ceiling() {
        assert_eq!(parse_ceiling(Some(&json!("80"))), 80);
        assert_eq!(parse_ceiling(Some(&json!(" 65 "))), 65);
        assert_eq!(parse_ceiling(Some(&json!(90))), 90);
        assert_eq!(parse_ceiling(Some(&json!("250"))), 100);
        assert_eq!(parse_ceiling(Some(&json!("0"))), 100);
        assert_eq!(parse_ceiling(Some(&json!("abc"))), 100);
        assert_eq!(parse_ceiling(None), 100);
    }

    #[tokio::test]
    async fn test_fetch_ceiling() {
        let client = FakeRequestClient::new();
        let service = QualityService::new(client.clone());

        let fetch = tokio::spawn(async move { service.fetch_ceiling().await });
        let call = client.next_call().await;
        assert_eq!(call.request.path, PUBLIC_CONFIG_PATH);
        call.respond(200, json!({"compress_quality": "75"}));

        assert_eq!(fetch.await.unwrap(), 75);
    }

    #[tokio::test]
    async fn test_fetch_ceiling_falls_back_on_network_error() {
        let client = FakeRequestClient::new();
        let service = QualityService::new(client.clone());

        let fetch = tokio::spawn(async move { service.fetch_ceiling().await });
        client.next_call().await.fail("connection refused");

        assert_eq!(fetch.await.unwrap(), 100);
    }
}
