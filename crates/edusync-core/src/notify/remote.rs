//! Best-effort mirror of notifications to the EduSync backend.
//!
//! Posts are spawned onto the ambient tokio runtime and never awaited by
//! the caller. Failures are logged and dropped; nothing is retried.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::channel::{ChannelKind, DeliveryContext, NotificationChannel};
use super::record::NotificationRecord;
use crate::error::ChannelError;
use crate::storage::RemoteConfig;

#[derive(Debug, Serialize)]
struct RemotePayload<'a> {
    title: &'a str,
    message: &'a str,
    category: &'a str,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Debug, Clone)]
pub struct RemoteSink {
    client: Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl RemoteSink {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ChannelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/notifications", base_url.trim_end_matches('/')),
            auth_token,
        })
    }

    /// `None` when the sink is disabled or has no base URL.
    pub fn from_config(config: &RemoteConfig) -> Result<Option<Self>, ChannelError> {
        if !config.enabled || config.base_url.trim().is_empty() {
            return Ok(None);
        }
        Self::new(
            &config.base_url,
            config.auth_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one record and wait for the answer.
    pub async fn post(&self, record: &NotificationRecord) -> Result<(), ChannelError> {
        let payload = RemotePayload {
            title: record.title(),
            message: &record.message.primary,
            category: record.category.as_str(),
            created_at: record.created_at.to_rfc3339(),
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Remote(format!("HTTP {status}: {text}")));
        }

        let body: RemoteResponse = resp.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(ChannelError::Remote("server reported failure".to_string()))
        }
    }
}

pub struct RemoteChannel {
    sink: RemoteSink,
}

impl RemoteChannel {
    pub fn new(sink: RemoteSink) -> Self {
        Self { sink }
    }
}

impl NotificationChannel for RemoteChannel {
    fn kind(&self) -> ChannelKind {
        ChannelKind::Remote
    }

    fn deliver(
        &mut self,
        record: &NotificationRecord,
        _ctx: &DeliveryContext,
    ) -> Result<(), ChannelError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| ChannelError::Unsupported("no async runtime".to_string()))?;

        let sink = self.sink.clone();
        let record = record.clone();
        handle.spawn(async move {
            match sink.post(&record).await {
                Ok(()) => debug!(id = %record.id, "notification mirrored"),
                Err(e) => warn!(id = %record.id, error = %e, "remote notification dropped"),
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::record::{Category, Message};

    fn record() -> NotificationRecord {
        NotificationRecord::new(
            Category::Focus,
            Message {
                primary: "Great work!".into(),
                secondary: "عمل رائع!".into(),
            },
            chrono::DateTime::from_timestamp(1_714_521_600, 0).unwrap(),
        )
    }

    fn sink(url: &str) -> RemoteSink {
        RemoteSink::new(url, Some("secret".into()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_record_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/notifications")
            .match_header("authorization", "Bearer secret")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "title": "Pomodoro complete!",
                "message": "Great work!",
                "category": "focus",
                "created_at": "2024-05-01T00:00:00+00:00",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        sink(&server.url()).post(&record()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/notifications")
            .with_status(500)
            .with_body("down")
            .create_async()
            .await;

        let err = sink(&server.url()).post(&record()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Remote(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn success_false_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/notifications")
            .with_status(200)
            .with_body(r#"{"success":false}"#)
            .create_async()
            .await;

        assert!(sink(&server.url()).post(&record()).await.is_err());
    }

    #[test]
    fn deliver_without_runtime_is_skipped() {
        let mut channel = RemoteChannel::new(sink("http://127.0.0.1:9"));
        let err = channel
            .deliver(&record(), &DeliveryContext::default())
            .unwrap_err();
        assert!(err.is_skip());
    }

    #[test]
    fn disabled_config_builds_no_sink() {
        assert!(RemoteSink::from_config(&RemoteConfig::default())
            .unwrap()
            .is_none());
        let cfg = RemoteConfig {
            enabled: true,
            base_url: "https://api.example.test/api/".into(),
            ..RemoteConfig::default()
        };
        let sink = RemoteSink::from_config(&cfg).unwrap().unwrap();
        assert_eq!(sink.endpoint(), "https://api.example.test/api/notifications");
    }
}
