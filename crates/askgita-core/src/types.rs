//! Domain types shared by the index, the pipeline and the transcript sinks.

use serde::{Deserialize, Serialize};

/// Position of a chunk in the chunk store; index rows refer to chunks by it.
pub type ChunkId = usize;

/// One nearest-neighbour hit as reported by an index, before it is resolved
/// against the chunk store. Lower `distance` is closer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: ChunkId,
    pub distance: f32,
}

/// A neighbour resolved to its chunk text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub distance: f32,
    pub text: String,
}

/// Outcome of the lexical intent check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Greeting,
    Thanks,
    Question,
}

/// How normalized input is compared against the keyword sets.
///
/// `Exact` requires the whole normalized input to equal a keyword, so
/// "that's great news" stays a question. `Contains` matches any keyword
/// appearing as a substring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    #[default]
    Exact,
    Contains,
}

/// A single question/answer round-trip as persisted to a transcript sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRecord {
    pub timestamp: String,
    pub question: String,
    pub answer: String,
}
