// SPDX-FileCopyrightText: 2026 Ferry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the remote collector.
//!
//! Provides [`HttpDeliveryClient`], which POSTs one record per request as
//! form-encoded or JSON key/value pairs and classifies the answer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ferry_config::model::DeliveryConfig;
use ferry_core::{
    Component, DeliveryClient, DeliveryFailure, Direction, FerryError, HealthStatus,
    PayloadEncoding, Record,
};

/// Longest response body kept in logs and failure reasons.
const MAX_LOGGED_BODY: usize = 512;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Fields sent for one record.
#[derive(Debug, Serialize)]
struct Payload<'a> {
    address: &'a str,
    body: &'a str,
    timestamp: i64,
    #[serde(rename = "type")]
    kind: Direction,
}

impl<'a> From<&'a Record> for Payload<'a> {
    fn from(record: &'a Record) -> Self {
        Self {
            address: &record.address,
            body: &record.body,
            timestamp: record.timestamp,
            kind: record.direction,
        }
    }
}

/// Application-level reply some collectors send with a 2xx status.
#[derive(Debug, Deserialize)]
struct CollectorReply {
    status: Option<String>,
    message: Option<String>,
}

/// Delivery client that POSTs each record to a fixed collector URL.
///
/// Each call is a single attempt bounded by the configured connect and
/// request timeouts. Retrying is the caller's business.
#[derive(Debug, Clone)]
pub struct HttpDeliveryClient {
    client: reqwest::Client,
    endpoint: String,
    encoding: PayloadEncoding,
    request_timeout: Duration,
}

impl HttpDeliveryClient {
    pub fn new(config: &DeliveryConfig) -> Result<Self, FerryError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(concat!("ferry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FerryError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint_url.clone(),
            encoding: config.encoding,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn encode(&self, record: &Record) -> Result<(Vec<u8>, &'static str), DeliveryFailure> {
        let payload = Payload::from(record);
        match self.encoding {
            PayloadEncoding::Form => serde_urlencoded::to_string(&payload)
                .map(|body| (body.into_bytes(), FORM_CONTENT_TYPE))
                .map_err(|e| DeliveryFailure::Aborted(format!("form encoding failed: {e}"))),
            PayloadEncoding::Json => serde_json::to_vec(&payload)
                .map(|body| (body, JSON_CONTENT_TYPE))
                .map_err(|e| DeliveryFailure::Aborted(format!("json encoding failed: {e}"))),
        }
    }

    fn classify_transport(&self, e: reqwest::Error) -> DeliveryFailure {
        if e.is_timeout() {
            DeliveryFailure::Timeout {
                duration: self.request_timeout,
            }
        } else {
            DeliveryFailure::Network(e.to_string())
        }
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_LOGGED_BODY) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// A 2xx body that is JSON with `"status": "error"` is a rejection.
fn rejected_by_reply(body: &str) -> Option<String> {
    let reply: CollectorReply = serde_json::from_str(body).ok()?;
    match reply.status.as_deref() {
        Some(status) if status.eq_ignore_ascii_case("error") => {
            Some(reply.message.unwrap_or_else(|| "collector reported an error".to_string()))
        }
        _ => None,
    }
}

#[async_trait]
impl Component for HttpDeliveryClient {
    fn name(&self) -> &str {
        "http-delivery"
    }

    async fn health_check(&self) -> Result<HealthStatus, FerryError> {
        match reqwest::Url::parse(&self.endpoint) {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("invalid endpoint: {e}"))),
        }
    }
}

#[async_trait]
impl DeliveryClient for HttpDeliveryClient {
    async fn send(&self, record: &Record) -> Result<(), DeliveryFailure> {
        let (body, content_type) = self.encode(record)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
            .body(body)
            .send()
            .await
            .map_err(|e| self.classify_transport(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| match self.classify_transport(e) {
                DeliveryFailure::Network(reason) => DeliveryFailure::MalformedResponse(reason),
                other => other,
            })?;
        let logged = truncate(&text);

        if !status.is_success() {
            return Err(DeliveryFailure::ServerRejected {
                status: status.as_u16(),
                body: logged,
            });
        }

        if let Some(message) = rejected_by_reply(&text) {
            return Err(DeliveryFailure::ServerRejected {
                status: status.as_u16(),
                body: truncate(&message),
            });
        }

        info!(record_id = %record.id, status = %status, response = %logged, "record delivered");
        debug!(record_id = %record.id, direction = %record.direction, "delivery payload accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::RecordId;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String, encoding: PayloadEncoding) -> DeliveryConfig {
        DeliveryConfig {
            endpoint_url: url,
            encoding,
            request_timeout_secs: 1,
            connect_timeout_secs: 1,
            ..DeliveryConfig::default()
        }
    }

    fn sample() -> Record {
        Record {
            id: RecordId(5),
            address: "+15550100".to_string(),
            body: "hi & bye".to_string(),
            timestamp: 1_700_000_000_123,
            direction: Direction::Inbound,
        }
    }

    #[tokio::test]
    async fn form_payload_carries_all_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collect"))
            .and(header("content-type", FORM_CONTENT_TYPE))
            .and(body_string(
                "address=%2B15550100&body=hi+%26+bye&timestamp=1700000000123&type=received",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"success"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpDeliveryClient::new(&config(
            format!("{}/collect", server.uri()),
            PayloadEncoding::Form,
        ))
        .unwrap();
        client.send(&sample()).await.unwrap();
    }

    #[tokio::test]
    async fn json_payload_uses_wire_type_names() {
        let server = MockServer::start().await;
        let mut record = sample();
        record.direction = Direction::Outbound;
        Mock::given(method("POST"))
            .and(header("content-type", JSON_CONTENT_TYPE))
            .and(body_json(serde_json::json!({
                "address": "+15550100",
                "body": "hi & bye",
                "timestamp": 1_700_000_000_123_i64,
                "type": "sent",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpDeliveryClient::new(&config(server.uri(), PayloadEncoding::Json)).unwrap();
        client.send(&record).await.unwrap();
    }

    #[tokio::test]
    async fn non_2xx_is_server_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client =
            HttpDeliveryClient::new(&config(server.uri(), PayloadEncoding::Form)).unwrap();
        assert_eq!(
            client.send(&sample()).await,
            Err(DeliveryFailure::ServerRejected {
                status: 503,
                body: "overloaded".to_string()
            })
        );
    }

    #[tokio::test]
    async fn error_reply_with_200_is_server_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"status":"error","message":"Missing required fields"}"#),
            )
            .mount(&server)
            .await;

        let client =
            HttpDeliveryClient::new(&config(server.uri(), PayloadEncoding::Form)).unwrap();
        assert_eq!(
            client.send(&sample()).await,
            Err(DeliveryFailure::ServerRejected {
                status: 200,
                body: "Missing required fields".to_string()
            })
        );
    }

    #[tokio::test]
    async fn plain_text_2xx_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client =
            HttpDeliveryClient::new(&config(server.uri(), PayloadEncoding::Form)).unwrap();
        assert!(client.send(&sample()).await.is_ok());
    }

    #[tokio::test]
    async fn slow_collector_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client =
            HttpDeliveryClient::new(&config(server.uri(), PayloadEncoding::Form)).unwrap();
        assert_eq!(
            client.send(&sample()).await,
            Err(DeliveryFailure::Timeout {
                duration: Duration::from_secs(1)
            })
        );
    }

    #[tokio::test]
    async fn unreachable_collector_is_network_failure() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let client = HttpDeliveryClient::new(&config(
            "http://127.0.0.1:9/collect".to_string(),
            PayloadEncoding::Form,
        ))
        .unwrap();
        let err = client.send(&sample()).await.unwrap_err();
        assert!(
            matches!(err, DeliveryFailure::Network(_) | DeliveryFailure::Timeout { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(MAX_LOGGED_BODY + 10);
        let logged = truncate(&body);
        assert_eq!(logged.len(), MAX_LOGGED_BODY + 3);
        assert!(logged.ends_with("..."));
    }

    #[test]
    fn success_reply_is_not_a_rejection() {
        assert_eq!(rejected_by_reply(r#"{"status":"success"}"#), None);
        assert_eq!(rejected_by_reply("not json"), None);
        assert_eq!(
            rejected_by_reply(r#"{"status":"error"}"#).as_deref(),
            Some("collector reported an error")
        );
    }
}
