use arrow_schema::{DataType, Field, Schema, TimeUnit};
use std::sync::Arc;

pub const CHUNK_ID: &str = "chunk_id";
pub const VECTOR: &str = "vector";
pub const META_TABLE: &str = "meta";

/// One row per chunk: its position in the chunk store and its embedding.
pub fn build_corpus_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new(CHUNK_ID, DataType::Int32, false),
		Field::new(VECTOR, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}

pub fn build_meta_schema() -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("key", DataType::Utf8, false),
		Field::new("value", DataType::Utf8, false),
		Field::new("updated_at", DataType::Timestamp(TimeUnit::Millisecond, None), false),
	]))
}

/// Vector width declared by a corpus table schema, if it has a vector column.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
	match schema.field_with_name(VECTOR).ok()?.data_type() {
		DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
		_ => None,
	}
}
