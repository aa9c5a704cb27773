use anyhow::{Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use arrow_array::{RecordBatch, RecordBatchIterator, Int32Array, FixedSizeListArray};
use std::sync::Arc;
use std::path::Path;

use askgita_core::traits::Embedder;
use askgita_core::ChunkStore;

use crate::schema::build_corpus_schema;
use crate::table::{open_db, table_exists, IndexMeta};

const BATCH_SIZE: usize = 1000;

/// Embeds a pre-split chunk store into a fresh Lance corpus table.
pub struct CorpusIndexWriter { db: Connection, table_name: String }

impl CorpusIndexWriter {
	pub async fn new(db_path: &Path, table_name: &str) -> Result<Self> {
		std::fs::create_dir_all(db_path)?;
		let db = open_db(db_path.to_string_lossy().as_ref()).await?;
		Ok(Self { db, table_name: table_name.to_string() })
	}

	/// Embed every chunk and write `(chunk_id, vector)` rows plus build metadata.
	/// Refuses to touch an existing table; remove it first to rebuild.
	pub async fn write(&self, chunks: &ChunkStore, embedder: &dyn Embedder) -> Result<usize> {
		if chunks.is_empty() { bail!("chunk store is empty; nothing to index"); }
		if table_exists(&self.db, &self.table_name).await? {
			bail!("table '{}' already exists; remove the index directory to rebuild it", self.table_name);
		}
		let dim = embedder.dim();
		tracing::info!(chunks = chunks.len(), table = %self.table_name, embedder = embedder.id(), "building corpus index");
		let pb = ProgressBar::new(chunks.len() as u64);
		pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")?.progress_chars("#>-"));
		let mut batch_ids = Vec::with_capacity(BATCH_SIZE);
		let mut batch_vectors = Vec::with_capacity(BATCH_SIZE);
		let mut written = 0usize;
		for (id, text) in chunks.iter() {
			let vector = embedder.embed(text)?;
			if vector.len() != dim { bail!("embedder returned {} dims for chunk {}, expected {}", vector.len(), id, dim); }
			batch_ids.push(i32::try_from(id)?);
			batch_vectors.push(vector);
			pb.inc(1);
			if batch_ids.len() >= BATCH_SIZE {
				written += self.insert_batch(&batch_ids, &batch_vectors, dim).await?;
				batch_ids.clear(); batch_vectors.clear();
			}
		}
		written += self.insert_batch(&batch_ids, &batch_vectors, dim).await?;
		pb.finish_with_message("corpus index written");

		let meta = IndexMeta {
			embedder_id: Some(embedder.id().to_string()),
			dim: Some(dim),
			chunk_count: Some(chunks.len()),
			chunks_fingerprint: Some(chunks.fingerprint().to_string()),
			metric: Some("l2".to_string()),
		};
		meta.write(&self.db, &self.table_name).await?;
		tracing::info!(rows = written, "corpus index complete");
		Ok(written)
	}

	async fn insert_batch(&self, ids: &[i32], vectors: &[Vec<f32>], dim: usize) -> Result<usize> {
		if ids.is_empty() { return Ok(0); }
		let dim = i32::try_from(dim)?;
		let schema = build_corpus_schema(dim);
		let record_batch = RecordBatch::try_new(schema.clone(), vec![
			Arc::new(Int32Array::from(ids.to_vec())),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
				vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
				dim,
			)),
		])?;
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
		if table_exists(&self.db, &self.table_name).await? {
			self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
		} else {
			self.db.create_table(&self.table_name, reader).execute().await?;
		}
		Ok(ids.len())
	}
}
