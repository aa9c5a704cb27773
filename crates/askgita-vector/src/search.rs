use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use arrow_array::{Float32Array, Int32Array};
use std::path::Path;

use askgita_core::error::{Error, Result};
use askgita_core::traits::VectorIndex;
use askgita_core::types::Neighbor;

use crate::schema::{vector_dim, CHUNK_ID};
use crate::table::{open_db, table_exists, IndexMeta};

fn index_err(e: impl std::fmt::Display) -> Error { Error::Index(e.to_string()) }

/// Read-only view of a Lance corpus table searched with L2 distance.
pub struct LanceCorpusIndex { db: Connection, table: Table, table_name: String, dim: usize, len: usize }

impl LanceCorpusIndex {
	pub async fn open(db_path: &Path, table_name: &str) -> Result<Self> {
		let not_loaded = |e: anyhow::Error| Error::IndexNotLoaded(format!("{}: {:#}", db_path.display(), e));
		if !db_path.exists() {
			return Err(Error::IndexNotLoaded(format!("index directory {} does not exist", db_path.display())));
		}
		let db = open_db(db_path.to_string_lossy().as_ref()).await.map_err(not_loaded)?;
		if !table_exists(&db, table_name).await.map_err(not_loaded)? {
			return Err(Error::IndexNotLoaded(format!("table '{}' not found in {}", table_name, db_path.display())));
		}
		let table = db.open_table(table_name).execute().await.map_err(|e| not_loaded(e.into()))?;
		let schema = table.schema().await.map_err(|e| not_loaded(e.into()))?;
		let dim = vector_dim(&schema)
			.ok_or_else(|| Error::IndexNotLoaded(format!("table '{}' has no fixed-size vector column", table_name)))?;
		let len = table.count_rows(None).await.map_err(|e| not_loaded(e.into()))?;
		tracing::info!(table = table_name, rows = len, dim, "opened corpus index");
		Ok(Self { db, table, table_name: table_name.to_string(), dim, len })
	}

	pub async fn meta(&self) -> Result<IndexMeta> {
		IndexMeta::read(&self.db, &self.table_name).await.map_err(|e| index_err(format!("{:#}", e)))
	}
}

#[async_trait]
impl VectorIndex for LanceCorpusIndex {
	fn dim(&self) -> usize { self.dim }
	fn len(&self) -> usize { self.len }

	async fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
		if query.len() != self.dim { return Err(Error::DimensionMismatch { expected: self.dim, actual: query.len() }); }
		if k == 0 || self.len == 0 { return Ok(Vec::new()); }
		let mut stream = self.table
			.vector_search(query.to_vec()).map_err(index_err)?
			.distance_type(DistanceType::L2)
			.limit(k)
			.select(Select::columns(&[CHUNK_ID]))
			.execute().await.map_err(index_err)?;
		let mut hits = Vec::with_capacity(k);
		while let Some(batch) = stream.try_next().await.map_err(index_err)? {
			let ids = batch.column_by_name(CHUNK_ID).and_then(|c| c.as_any().downcast_ref::<Int32Array>())
				.ok_or_else(|| Error::Index("result batch has no chunk_id column".into()))?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>())
				.ok_or_else(|| Error::Index("result batch has no _distance column".into()))?;
			for i in 0..batch.num_rows() {
				let raw = ids.value(i);
				let id = usize::try_from(raw).map_err(|_| Error::CorruptIndex { id: i64::from(raw), len: self.len })?;
				hits.push(Neighbor { id, distance: distances.value(i) });
			}
		}
		// stable, so equal distances keep the order Lance returned them in
		hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
		hits.truncate(k);
		Ok(hits)
	}
}
