use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::{AnalyticsEvent, AnalyticsInteraction, AnalyticsSink};
use crate::error::{ProviderError, ProviderResult};

pub const EVENTS_DATASOURCE: &str = "events__v1";
pub const INTERACTIONS_DATASOURCE: &str = "interactions__v1";

/// Tinybird connection configuration
#[derive(Debug, Clone)]
pub struct TinybirdConfig {
    pub token: String,
    pub base_url: String,
}

impl TinybirdConfig {
    pub fn new(token: String) -> Self {
        Self {
            token,
            base_url: "https://api.tinybird.co".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn from_env() -> ProviderResult<Self> {
        let token = std::env::var("TINYBIRD_TOKEN")
            .map_err(|_| ProviderError::NotConfigured("TINYBIRD_TOKEN not set".to_string()))?;

        let base_url = std::env::var("TINYBIRD_BASE_URL")
            .unwrap_or_else(|_| "https://api.tinybird.co".to_string());

        Ok(Self { token, base_url })
    }
}

/// Analytics sink backed by the Tinybird events API
pub struct TinybirdSink {
    client: Client,
    config: TinybirdConfig,
}

impl TinybirdSink {
    pub fn new(config: TinybirdConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        Ok(Self::new(TinybirdConfig::from_env()?))
    }

    /// Ship one NDJSON row to a datasource and return the acknowledgement.
    async fn ingest_row<T: Serialize + Sync>(
        &self,
        datasource: &str,
        row: &T,
    ) -> ProviderResult<Value> {
        let url = format!(
            "{}/v0/events?name={}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(datasource)
        );

        let body = serde_json::to_string(row)?;

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthError(
                    format!("Tinybird rejected credentials: {}", error_text),
                ),
                _ => ProviderError::ApiError(format!(
                    "Tinybird ingest to {} failed ({}): {}",
                    datasource, status, error_text
                )),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl AnalyticsSink for TinybirdSink {
    async fn ingest_event(&self, event: &AnalyticsEvent) -> ProviderResult<Value> {
        self.ingest_row(EVENTS_DATASOURCE, event).await
    }

    async fn ingest_interaction(
        &self,
        interaction: &AnalyticsInteraction,
    ) -> ProviderResult<Value> {
        self.ingest_row(INTERACTIONS_DATASOURCE, interaction).await
    }
}
