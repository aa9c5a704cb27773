//! Exact in-memory L2 index.
//!
//! Small corpora (a few thousand verses) fit comfortably in memory, and an
//! exhaustive scan gives reproducible results: ties are broken by insertion
//! order. Can be loaded wholesale from a Lance corpus table.

use async_trait::async_trait;
use arrow_array::cast::AsArray;
use arrow_array::{Array, FixedSizeListArray, Int32Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use std::path::Path;

use askgita_core::error::{Error, Result};
use askgita_core::traits::VectorIndex;
use askgita_core::types::{ChunkId, Neighbor};

use crate::search::LanceCorpusIndex;
use crate::schema::{CHUNK_ID, VECTOR};
use crate::table::{open_db, table_exists};

pub struct FlatIndex { dim: usize, entries: Vec<(ChunkId, Vec<f32>)> }

impl FlatIndex {
	/// Build from `(chunk id, vector)` pairs; every vector must have `dim` components.
	pub fn new(dim: usize, entries: Vec<(ChunkId, Vec<f32>)>) -> Result<Self> {
		if let Some((_, v)) = entries.iter().find(|(_, v)| v.len() != dim) {
			return Err(Error::DimensionMismatch { expected: dim, actual: v.len() });
		}
		Ok(Self { dim, entries })
	}

	/// Vectors in chunk-store order, vector `i` belonging to chunk `i`.
	pub fn from_vectors(dim: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
		Self::new(dim, vectors.into_iter().enumerate().collect())
	}

	pub async fn load(db_path: &Path, table_name: &str) -> Result<Self> {
		// validates existence and schema the same way the Lance-backed index does
		let lance = LanceCorpusIndex::open(db_path, table_name).await?;
		let (dim, rows) = (lance.dim(), lance.len());
		let not_loaded = |e: String| Error::IndexNotLoaded(format!("{}: {}", db_path.display(), e));
		let db = open_db(db_path.to_string_lossy().as_ref()).await.map_err(|e| not_loaded(format!("{:#}", e)))?;
		if !table_exists(&db, table_name).await.map_err(|e| not_loaded(format!("{:#}", e)))? {
			return Err(not_loaded(format!("table '{}' disappeared", table_name)));
		}
		let table = db.open_table(table_name).execute().await.map_err(|e| not_loaded(e.to_string()))?;
		let mut stream = table.query().select(Select::columns(&[CHUNK_ID, VECTOR])).execute().await.map_err(|e| not_loaded(e.to_string()))?;
		let mut entries = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(|e| not_loaded(e.to_string()))? {
			let ids = batch.column_by_name(CHUNK_ID).and_then(|c| c.as_any().downcast_ref::<Int32Array>())
				.ok_or_else(|| not_loaded("missing chunk_id column".into()))?;
			let vecs = batch.column_by_name(VECTOR).and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
				.ok_or_else(|| not_loaded("missing vector column".into()))?;
			for i in 0..batch.num_rows() {
				if !vecs.is_valid(i) { continue; }
				let raw = ids.value(i);
				let id = usize::try_from(raw).map_err(|_| Error::CorruptIndex { id: i64::from(raw), len: rows })?;
				let inner = vecs.value(i);
				let v = inner.as_primitive::<arrow_array::types::Float32Type>().values().to_vec();
				entries.push((id, v));
			}
		}
		entries.sort_by_key(|(id, _)| *id);
		tracing::info!(table = table_name, rows = entries.len(), dim, "loaded corpus index into memory");
		Self::new(dim, entries)
	}
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[async_trait]
impl VectorIndex for FlatIndex {
	fn dim(&self) -> usize { self.dim }
	fn len(&self) -> usize { self.entries.len() }

	async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim { return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() }); }
		let mut hits: Vec<Neighbor> = self.entries.iter()
			.map(|(id, v)| Neighbor { id: *id, distance: squared_l2(query, v) })
			.collect();
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(k);
		Ok(hits)
	}
}
