use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{VectorIndex, VectorMatch, VectorRecord};
use crate::error::{ProviderError, ProviderResult};

/// Vector index connection configuration
#[derive(Debug, Clone)]
pub struct VectorIndexConfig {
    pub url: String,
    pub token: String,
}

impl VectorIndexConfig {
    pub fn new(url: String, token: String) -> Self {
        Self { url, token }
    }

    pub fn from_env() -> ProviderResult<Self> {
        let url = std::env::var("VECTOR_URL")
            .map_err(|_| ProviderError::NotConfigured("VECTOR_URL not set".to_string()))?;

        let token = std::env::var("VECTOR_TOKEN")
            .map_err(|_| ProviderError::NotConfigured("VECTOR_TOKEN not set".to_string()))?;

        Ok(Self { url, token })
    }
}

/// REST client for the hosted vector index
pub struct HttpVectorIndex {
    client: Client,
    config: VectorIndexConfig,
}

impl HttpVectorIndex {
    pub fn new(config: VectorIndexConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> ProviderResult<Self> {
        Ok(Self::new(VectorIndexConfig::from_env()?))
    }

    async fn post<Req, Res>(&self, path: &str, body: &Req) -> ProviderResult<Res>
    where
        Req: Serialize + Sync,
        Res: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.config.url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.token))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthError(
                    format!("vector index rejected credentials: {}", error_text),
                ),
                _ => ProviderError::ApiError(format!(
                    "vector index {} returned {}: {}",
                    path, status, error_text
                )),
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    matches: Vec<VectorMatch>,
}

#[derive(Debug, Serialize)]
struct IdsRequest<'a> {
    ids: &'a [String],
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    vectors: Vec<VectorRecord>,
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> ProviderResult<()> {
        // Acknowledgement body carries nothing the engine needs.
        let _: serde_json::Value = self.post("upsert", &records).await?;
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> ProviderResult<Vec<VectorMatch>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
        };

        let response: QueryResponse = self.post("query", &request).await?;
        Ok(response.matches)
    }

    async fn fetch(&self, ids: &[String]) -> ProviderResult<Vec<VectorRecord>> {
        let response: FetchResponse = self.post("fetch", &IdsRequest { ids }).await?;
        Ok(response.vectors)
    }

    async fn delete(&self, ids: &[String]) -> ProviderResult<()> {
        let _: serde_json::Value = self.post("delete", &IdsRequest { ids }).await?;
        Ok(())
    }
}
