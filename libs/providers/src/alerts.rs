use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, warn};
use uuid::Uuid;

use crate::error::ProviderResult;

/// Trait for operator alerting on unrecoverable failures
///
/// Delivery is best effort. Implementations log and swallow transport
/// failures; an alert that cannot be sent must never fail the compensation
/// processor that raised it.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, action_id: Uuid, description: &str) -> ProviderResult<()>;
}

#[derive(Debug, Serialize)]
struct AlertPayload<'a> {
    alert: &'static str,
    #[serde(rename = "actionId")]
    action_id: Uuid,
    description: &'a str,
    timestamp: String,
}

/// Alert notifier posting to a configured webhook
///
/// Without a webhook URL the notifier still logs every alert, so a bare
/// deployment keeps an operator trail.
pub struct WebhookNotifier {
    client: Client,
    webhook_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("ALERTS_WEBHOOK").ok())
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn notify(&self, action_id: Uuid, description: &str) -> ProviderResult<()> {
        error!(%action_id, description, "manual intervention required");

        let Some(url) = &self.webhook_url else {
            return Ok(());
        };

        let payload = AlertPayload {
            alert: "Manual intervention required",
            action_id,
            description,
            timestamp: Utc::now().to_rfc3339(),
        };

        let result = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "alert webhook rejected payload");
            }
            Err(e) => {
                warn!(error = %e, "failed to deliver alert webhook");
            }
            Ok(_) => {}
        }

        Ok(())
    }
}
