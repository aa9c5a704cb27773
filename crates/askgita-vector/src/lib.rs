//! Corpus index storage and nearest-neighbour search.
//!
//! The corpus index lives in a LanceDB table of `(chunk_id, vector)` rows; a
//! `meta` table next to it records which embedder and chunk store built it.

use std::sync::Arc;

use askgita_core::config::Settings;
use askgita_core::error::Result;
use askgita_core::traits::VectorIndex;

pub mod flat;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use flat::FlatIndex;
pub use search::LanceCorpusIndex;
pub use table::IndexMeta;
pub use writer::CorpusIndexWriter;

/// Open the configured corpus index, either served by Lance or scanned in memory.
pub async fn open_index(settings: &Settings) -> Result<Arc<dyn VectorIndex>> {
	let dir = settings.index_dir();
	if settings.index.in_memory {
		Ok(Arc::new(FlatIndex::load(&dir, &settings.corpus.table).await?))
	} else {
		Ok(Arc::new(LanceCorpusIndex::open(&dir, &settings.corpus.table).await?))
	}
}

/// Recorded build metadata for the configured table, empty if none was written.
pub async fn read_meta(settings: &Settings) -> anyhow::Result<IndexMeta> {
	let conn = table::open_db(settings.index_dir().to_string_lossy().as_ref()).await?;
	IndexMeta::read(&conn, &settings.corpus.table).await
}
