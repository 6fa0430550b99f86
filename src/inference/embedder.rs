use anyhow::{anyhow, Context, Result};
use candle::{DType, Device};
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use std::path::Path;
use tokenizers::Tokenizer;
use tracing::info;

use super::bert::{
    build_var_builder, encode, find_model_weights, input_tensors, load_json, load_tokenizer,
};

/// Sentence embeddings from a BERT encoder, mean-pooled over all tokens.
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
}

impl BertEmbedder {
    pub fn load(snapshot: &Path, device: Device) -> Result<Self> {
        info!("📁 embedding snapshot: {}", snapshot.display());

        let config: BertConfig = load_json(snapshot, "config.json")?;
        let tokenizer = load_tokenizer(snapshot, config.max_position_embeddings, true)?;

        let weights = find_model_weights(snapshot)
            .ok_or_else(|| anyhow!("no model weights found under {}", snapshot.display()))?;
        let vb = build_var_builder(&weights, DType::F32, &device)?;
        let model = BertModel::load(vb, &config).context("failed to load embedding model")?;

        info!("🚀 embedding model loaded on {device:?}");

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let enc = encode(&self.tokenizer, text)?;
        let (input, token_type_ids) = input_tensors(&enc, &self.device)?;

        let hidden = self
            .model
            .forward(&input, &token_type_ids, None)
            .context("embedding forward pass failed")?;

        let (_batch, seq_len, _hidden) = hidden.dims3()?;
        let pooled = (hidden.sum(1)? / seq_len as f64)?;
        Ok(pooled.squeeze(0)?.to_vec1::<f32>()?)
    }
}
