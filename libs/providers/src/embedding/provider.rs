use async_trait::async_trait;
use tracing::warn;

use crate::error::ProviderResult;

/// Trait for text embedding generation
///
/// Implementations can use different embedding APIs (OpenAI, local models).
/// The engine pins a single model per deployment, so the trait carries the
/// output dimensionality rather than taking a model per call.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Output vector length for the configured model
    fn dimensions(&self) -> usize;

    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;
}

/// True when every component is exactly zero.
///
/// A zero vector is the "no signal" sentinel throughout the engine: callers
/// use this to branch into fallbacks instead of treating it as an error.
pub fn is_zero_vector(vector: &[f32]) -> bool {
    vector.iter().all(|v| *v == 0.0)
}

/// Embed `text`, degrading to the zero vector instead of failing.
///
/// Blank input never reaches the API. Provider errors are logged and
/// swallowed so recommendation retrieval keeps working without the
/// embedding backend; ingestion paths that must not accept a zero vector
/// check with [`is_zero_vector`] afterwards.
pub async fn embed_or_zero(provider: &dyn EmbeddingProvider, text: &str) -> Vec<f32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![0.0; provider.dimensions()];
    }

    match provider.embed(trimmed).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!(error = %e, "embedding generation failed, falling back to zero vector");
            vec![0.0; provider.dimensions()]
        }
    }
}
