use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ExchangeRecord, Neighbor};

/// Turns text into a fixed-length vector. Must be the same model that built the index.
pub trait Embedder: Send + Sync {
    /// Stable identifier recorded alongside an index (e.g. `bert:all-MiniLM-L6-v2:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Read-only nearest-neighbour index over the chunk embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn dim(&self) -> usize;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    /// Up to `k` neighbours of `query`, nearest first.
    async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;
}

/// Hosted model turning a grounding prompt into an answer.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Append-only store of exchanges kept outside the process.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    async fn append(&self, record: &ExchangeRecord) -> Result<()>;
}
