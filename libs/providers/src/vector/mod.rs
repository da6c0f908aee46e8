mod http;
mod index;

pub use http::{HttpVectorIndex, VectorIndexConfig};
pub use index::{VectorIndex, VectorMatch, VectorMetadata, VectorRecord};

#[cfg(any(test, feature = "mock"))]
pub use index::MockVectorIndex;
