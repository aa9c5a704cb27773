use std::sync::Arc;

use askgita_core::error::{Error, Result};
use askgita_core::traits::VectorIndex;
use askgita_core::types::RetrievedChunk;
use askgita_core::ChunkStore;

/// Number of passages placed in every prompt.
pub const TOP_K: usize = 4;

/// Resolves index hits to chunk texts, nearest first.
///
/// The index and the chunk store are separate files that can drift apart, so
/// every id is bounds-checked; an id past the end is [`Error::CorruptIndex`].
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    chunks: Arc<ChunkStore>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>, chunks: Arc<ChunkStore>) -> Self { Self { index, chunks } }

    pub async fn retrieve_hits(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let mut neighbors = self.index.search(query, k).await?;
        neighbors.truncate(k);
        neighbors
            .into_iter()
            .map(|n| {
                let text = self.chunks.get(n.id).ok_or_else(|| Error::CorruptIndex {
                    id: i64::try_from(n.id).unwrap_or(i64::MAX),
                    len: self.chunks.len(),
                })?;
                Ok(RetrievedChunk { id: n.id, distance: n.distance, text: text.to_string() })
            })
            .collect()
    }

    pub async fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<String>> {
        Ok(self.retrieve_hits(query, k).await?.into_iter().map(|c| c.text).collect())
    }
}
