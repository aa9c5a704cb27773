//! Query and chunk embedders.
//!
//! `SentenceEmbedder` runs a sentence-transformers BERT checkpoint (by default
//! all-MiniLM-L6-v2) through candle with masked mean pooling and L2
//! normalization, matching how the corpus vectors were produced.
//! `HashEmbedder` is a weight-free stand-in for tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::{Tokenizer, TruncationParams};

use askgita_core::config::Settings;
use askgita_core::error::{Error, Result};
use askgita_core::traits::Embedder;

mod device;
mod hash;
mod pool;
mod tokenize;

pub use device::select_device;
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

/// Dimension of all-MiniLM-L6-v2, also used by the hash embedder so fake
/// and real indexes have the same shape.
pub const DEFAULT_DIM: usize = 384;

pub struct SentenceEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    max_len: usize,
    dim: usize,
    id: String,
}

fn unavailable(what: &str, e: impl std::fmt::Display) -> Error {
    Error::ModelUnavailable(format!("{}: {}", what, e))
}

impl SentenceEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(Error::ModelUnavailable(format!("model directory {} does not exist", model_dir.display())));
        }
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| unavailable(&format!("failed to load tokenizer from {}", tokenizer_path.display()), e))?;
        tokenizer.with_padding(None);
        tokenizer
            .with_truncation(Some(TruncationParams { max_length: max_len, ..Default::default() }))
            .map_err(|e| unavailable("failed to configure truncation", e))?;

        let config_path = model_dir.join("config.json");
        let raw_config = std::fs::read_to_string(&config_path)
            .map_err(|e| unavailable(&format!("failed to read {}", config_path.display()), e))?;
        let config: BertConfig = serde_json::from_str(&raw_config).map_err(|e| unavailable("invalid model config", e))?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw_config)
            .ok()
            .and_then(|v| v.get("hidden_size").and_then(serde_json::Value::as_u64))
            .ok_or_else(|| Error::ModelUnavailable("model config has no hidden_size".into()))? as usize;

        let vb = Self::load_weights(model_dir, &device)?;
        let model = BertModel::load(vb, &config).map_err(|e| unavailable("failed to build model", e))?;

        let name = model_dir.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "bert".to_string());
        let id = format!("bert:{}:d{}", name, dim);
        tracing::info!(%id, max_len, "embedding model loaded");
        Ok(Self { model, tokenizer, device, max_len, dim, id })
    }

    fn load_weights(model_dir: &Path, device: &Device) -> Result<VarBuilder<'static>> {
        let safetensors = model_dir.join("model.safetensors");
        if safetensors.exists() {
            // SAFETY: the weights file is opened read-only and not modified while mapped.
            return unsafe { VarBuilder::from_mmaped_safetensors(&[safetensors], DType::F32, device) }
                .map_err(|e| unavailable("failed to map model.safetensors", e));
        }
        let pickle = model_dir.join("pytorch_model.bin");
        if pickle.exists() {
            let weights = candle_core::pickle::read_all(&pickle).map_err(|e| unavailable("failed to read pytorch_model.bin", e))?;
            let weights_map: std::collections::HashMap<String, candle_core::Tensor> = weights.into_iter().collect();
            return Ok(VarBuilder::from_tensors(weights_map, DType::F32, device));
        }
        Err(Error::ModelUnavailable(format!("no model.safetensors or pytorch_model.bin in {}", model_dir.display())))
    }

    fn embed_inner(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let (input_ids, attention_mask, token_type_ids) = tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let v = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        anyhow::ensure!(v.len() == self.dim, "model produced {} dims, expected {}", v.len(), self.dim);
        Ok(v)
    }
}

impl Embedder for SentenceEmbedder {
    fn id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let v = self.embed_inner(text).map_err(|e| unavailable("embedding failed", e))?;
        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "embedded text");
        Ok(v)
    }
}

/// Build the embedder the settings ask for. A missing model is fatal; there
/// is no silent fallback to the hash embedder.
pub fn embedder_from_settings(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    if settings.embedding.fake {
        tracing::warn!("using HashEmbedder; answers will not be semantically grounded");
        return Ok(Arc::new(HashEmbedder::new(DEFAULT_DIM)));
    }
    Ok(Arc::new(SentenceEmbedder::load(&settings.model_dir(), settings.embedding.max_len)?))
}
