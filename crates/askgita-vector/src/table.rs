//! LanceDB connection and housekeeping helpers.
//!
//! Provides database open functions, ensure-* helpers for tables, and a simple
//! key/value metadata table recording how each corpus table was built.

use anyhow::Result;
use lancedb::{connect, Connection};

use arrow_array::{RecordBatch, RecordBatchIterator, StringArray, TimestampMillisecondArray};
use std::sync::Arc;
use chrono::Utc;
use lancedb::query::{QueryBase, ExecutableQuery};

use crate::schema::{build_meta_schema, META_TABLE};

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn.table_names().execute().await?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> Result<()> {
    if table_exists(conn, name).await? {
        return Ok(());
    }
    // create empty table with 0 rows
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await?;
    Ok(())
}

pub async fn ensure_meta_table(conn: &Connection) -> Result<()> {
    ensure_table(conn, META_TABLE, build_meta_schema()).await
}

pub async fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    ensure_meta_table(conn).await?;
    let t = conn.open_table(META_TABLE).execute().await?;
    let rb = RecordBatch::try_new(
        build_meta_schema(),
        vec![
            Arc::new(StringArray::from(vec![key.to_string()])),
            Arc::new(StringArray::from(vec![value.to_string()])),
            Arc::new(TimestampMillisecondArray::from(vec![Utc::now().timestamp_millis()])),
        ],
    )?;
    let reader = Box::new(RecordBatchIterator::new(vec![Ok(rb)].into_iter(), build_meta_schema()));
    // Upsert behavior via merge_insert: key is unique
    let mut mi = t.merge_insert(&["key"]);
    mi.when_matched_update_all(None).when_not_matched_insert_all();
    let _ = mi.execute(reader).await?;
    Ok(())
}

pub async fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    if !table_exists(conn, META_TABLE).await? { return Ok(None); }
    let t = conn.open_table(META_TABLE).execute().await?;
    let mut stream = t.query().only_if(format!("key = '{}'", key.replace('\'', "''"))).execute().await?;
    while let Some(batch) = futures::TryStreamExt::try_next(&mut stream).await? {
        if batch.num_rows() == 0 { continue; }
        let val = batch.column_by_name("value").and_then(|c| c.as_any().downcast_ref::<StringArray>()).ok_or_else(|| anyhow::anyhow!("meta.value column missing"))?;
        return Ok(Some(val.value(0).to_string()));
    }
    Ok(None)
}

/// Build parameters recorded next to a corpus table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMeta {
    pub embedder_id: Option<String>,
    pub dim: Option<usize>,
    pub chunk_count: Option<usize>,
    pub chunks_fingerprint: Option<String>,
    pub metric: Option<String>,
}

fn meta_key(table: &str, field: &str) -> String { format!("{}:{}", table, field) }

impl IndexMeta {
    pub async fn read(conn: &Connection, table: &str) -> Result<Self> {
        Ok(Self {
            embedder_id: get_meta(conn, &meta_key(table, "embedder_id")).await?,
            dim: get_meta(conn, &meta_key(table, "dim")).await?.and_then(|v| v.parse().ok()),
            chunk_count: get_meta(conn, &meta_key(table, "chunk_count")).await?.and_then(|v| v.parse().ok()),
            chunks_fingerprint: get_meta(conn, &meta_key(table, "chunks_fingerprint")).await?,
            metric: get_meta(conn, &meta_key(table, "metric")).await?,
        })
    }

    pub async fn write(&self, conn: &Connection, table: &str) -> Result<()> {
        let fields = [
            ("embedder_id", self.embedder_id.clone()),
            ("dim", self.dim.map(|d| d.to_string())),
            ("chunk_count", self.chunk_count.map(|c| c.to_string())),
            ("chunks_fingerprint", self.chunks_fingerprint.clone()),
            ("metric", self.metric.clone()),
        ];
        for (field, value) in fields {
            if let Some(value) = value { set_meta(conn, &meta_key(table, field), &value).await?; }
        }
        Ok(())
    }
}
