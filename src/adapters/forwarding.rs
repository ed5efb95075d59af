//! Downstream status forwarding
//!
//! Tells the downstream service that a participant finished the instrument
//! that gates their next step. The call is a plain `GET` with no body.

use crate::domain::{BridgeError, RecordId, Result};
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::time::Duration;

/// What the downstream service answered
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamReply {
    /// HTTP status code
    pub status_code: u16,

    /// JSON body when it parses, the raw text otherwise
    pub body: Value,
}

/// HTTP client for the downstream service
pub struct ForwardingClient {
    base_url: String,
    client: Client,
}

impl ForwardingClient {
    /// Create a client for `base_url` with a request timeout
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| {
                BridgeError::Configuration(format!("Failed to build forwarding HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Target URL for a participant
    pub fn status_url(&self, user_id: &RecordId) -> String {
        format!("{}/users/{}/status/today", self.base_url, user_id)
    }

    /// Notify the downstream service
    ///
    /// Any HTTP response, successful or not, is returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns a forwarding error when no response arrives (connection
    /// failure or timeout).
    pub async fn notify(&self, user_id: &RecordId) -> Result<UpstreamReply> {
        let url = self.status_url(user_id);

        let resp = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Forwarding request failed");
            BridgeError::Forwarding(format!("GET {url} failed: {e}"))
        })?;

        let status_code = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| BridgeError::Forwarding(format!("Failed to read reply from {url}: {e}")))?;
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

        tracing::info!(
            user_id = %user_id,
            url = %url,
            status = status_code,
            "Forwarded completion"
        );

        Ok(UpstreamReply { status_code, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_url_trims_trailing_slash() {
        let client = ForwardingClient::new("https://plc.example.org/api/", 15).unwrap();
        let user = RecordId::new("EL0001").unwrap();
        assert_eq!(
            client.status_url(&user),
            "https://plc.example.org/api/users/EL0001/status/today"
        );
    }

    #[tokio::test]
    async fn test_notify_returns_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/EL0001/status/today")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"started":true}"#)
            .create_async()
            .await;

        let client = ForwardingClient::new(&server.url(), 5).unwrap();
        let reply = client
            .notify(&RecordId::new("EL0001").unwrap())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply.status_code, 200);
        assert_eq!(reply.body, json!({"started": true}));
    }

    #[tokio::test]
    async fn test_notify_keeps_text_body_and_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/LT0002/status/today")
            .with_status(404)
            .with_body("no such user")
            .create_async()
            .await;

        let client = ForwardingClient::new(&server.url(), 5).unwrap();
        let reply = client
            .notify(&RecordId::new("LT0002").unwrap())
            .await
            .unwrap();

        assert_eq!(reply.status_code, 404);
        assert_eq!(reply.body, json!("no such user"));
    }
}
