pub mod chunk_store;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunk_store::ChunkStore;
pub use error::{Error, Result};
