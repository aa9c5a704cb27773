//! The parallel array of chunk texts that index rows point into.
//!
//! Stored on disk as a JSON array of strings; element `i` is chunk id `i`.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::ChunkId;

#[derive(Debug, Clone)]
pub struct ChunkStore {
    chunks: Vec<String>,
    fingerprint: String,
}

impl ChunkStore {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .map_err(|e| Error::IndexNotLoaded(format!("cannot read chunk store {}: {}", path.display(), e)))?;
        let chunks: Vec<String> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::IndexNotLoaded(format!("chunk store {} is not a JSON array of strings: {}", path.display(), e)))?;
        tracing::info!(path = %path.display(), chunks = chunks.len(), "loaded chunk store");
        Ok(Self::from_chunks(chunks))
    }

    pub fn from_chunks(chunks: Vec<String>) -> Self {
        let bytes = serde_json::to_vec(&chunks).unwrap_or_default();
        let fingerprint = blake3::hash(&bytes).to_hex().to_string();
        Self { chunks, fingerprint }
    }

    pub fn len(&self) -> usize { self.chunks.len() }
    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }

    pub fn get(&self, id: ChunkId) -> Option<&str> { self.chunks.get(id).map(String::as_str) }

    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &str)> {
        self.chunks.iter().enumerate().map(|(i, c)| (i, c.as_str()))
    }

    pub fn texts(&self) -> &[String] { &self.chunks }

    /// blake3 hex digest of the canonical JSON encoding, recorded by the index writer.
    pub fn fingerprint(&self) -> &str { &self.fingerprint }
}
