mod openai;
mod provider;

pub use openai::{
    DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL, EmbeddingConfig, OpenAIProvider,
};
pub use provider::{EmbeddingProvider, embed_or_zero, is_zero_vector};

#[cfg(any(test, feature = "mock"))]
pub use provider::MockEmbeddingProvider;
