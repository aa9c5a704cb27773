//! Retrieval-augmented question answering over the Gita corpus.
//!
//! question → [`intent`] (greetings and thanks short-circuit) → embed →
//! [`retriever`] (k = 4) → [`prompt`] → answer generator → [`Reply`],
//! mirrored best-effort to a [`transcript`] sink.

pub mod intent;
pub mod pipeline;
pub mod prompt;
pub mod reply;
pub mod retriever;
pub mod session;
pub mod transcript;

pub use intent::IntentClassifier;
pub use pipeline::{AskGita, CorpusContext};
pub use prompt::PromptBuilder;
pub use reply::Reply;
pub use retriever::{Retriever, TOP_K};
pub use session::{Session, Speaker, Turn};
pub use transcript::{JsonlTranscript, MemoryTranscript};
