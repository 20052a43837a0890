//! Webhook notification sink
//!
//! Posts `{"text": "..."}` to a chat-style incoming webhook.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::defaults;
use crate::core::notify::{Notification, Notifier};
use crate::error::TransportError;

/// Notifier posting JSON to a webhook URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    /// HTTP client
    client: reqwest::Client,
    /// Target URL
    url: String,
}

impl WebhookNotifier {
    /// Create a notifier for the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(defaults::WEBHOOK_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            url: url.into(),
        }
    }

    /// Get the target URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError> {
        let payload = serde_json::json!({ "text": notification.text() });

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TransportError::Webhook {
                url: self.url.clone(),
                error: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(TransportError::Webhook {
                url: self.url.clone(),
                error: format!("HTTP {}", response.status()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn published() -> Notification {
        Notification::Published {
            artifacts: 2,
            host: "repo".to_string(),
            success: true,
        }
    }

    #[tokio::test]
    async fn test_posts_text_payload() {
        let server = MockServer::start().await;
        let expected = serde_json::json!({ "text": published().text() });
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(&expected))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/hook", server.uri()));
        notifier.notify(&published()).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_error_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(server.uri());
        let result = notifier.notify(&published()).await;
        assert!(matches!(result, Err(TransportError::Webhook { .. })));
    }
}
