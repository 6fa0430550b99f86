//! Loading helpers shared by the BERT embedder and the NER tagger.

use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use hf_hub::api::sync::Api;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tokenizers::{
    models::wordpiece::WordPiece,
    normalizers::{bert::BertNormalizer, NormalizerWrapper},
    pre_tokenizers::{bert::BertPreTokenizer, PreTokenizerWrapper},
    processors::{bert::BertProcessing, PostProcessorWrapper},
    Encoding, Tokenizer, TruncationParams,
};
use tracing::{debug, info, warn};

const WEIGHT_CANDIDATES: [&str; 3] = ["model.safetensors", "pytorch_model.bin", "model.bin"];

/// Resolves a model reference to a directory holding `config.json`, the
/// tokenizer files and the weights.
///
/// An existing directory is used as is. Anything else is treated as a hub repo
/// id and fetched into the local hf-hub cache.
pub fn resolve_snapshot(model: &str) -> Result<PathBuf> {
    let local = PathBuf::from(model);
    if local.is_dir() {
        debug!("using local snapshot {}", local.display());
        return Ok(local);
    }
    fetch_from_hub(model)
}

fn fetch_from_hub(repo_id: &str) -> Result<PathBuf> {
    info!("fetching {repo_id} from the hub");
    let api = Api::new().context("failed to initialize hf-hub client")?;
    let repo = api.model(repo_id.to_string());

    let config = repo
        .get("config.json")
        .with_context(|| format!("failed to fetch config.json from {repo_id}"))?;

    for optional in ["tokenizer.json", "vocab.txt"] {
        if let Err(err) = repo.get(optional) {
            debug!("{repo_id} has no {optional}: {err}");
        }
    }

    if !WEIGHT_CANDIDATES
        .iter()
        .any(|candidate| repo.get(candidate).is_ok())
    {
        return Err(anyhow!("no model weights published in {repo_id}"));
    }

    config
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("hf-hub returned a config path without a parent"))
}

pub fn load_json<T: DeserializeOwned>(snapshot: &Path, file: &str) -> Result<T> {
    let path = snapshot.join(file);
    if !path.exists() {
        return Err(anyhow!("{file} not found under {}", snapshot.display()));
    }
    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

pub fn find_model_weights(snapshot: &Path) -> Option<PathBuf> {
    WEIGHT_CANDIDATES
        .iter()
        .map(|candidate| snapshot.join(candidate))
        .find(|path| path.exists())
}

pub fn build_var_builder(
    path: &Path,
    dtype: DType,
    device: &Device,
) -> Result<VarBuilder<'static>> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if ext == "safetensors" {
        let files = vec![path.to_path_buf()];
        // SAFETY: the snapshot files are not modified while the model is alive.
        unsafe {
            VarBuilder::from_mmaped_safetensors(&files, dtype, device)
                .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
        }
    } else {
        VarBuilder::from_pth(path, dtype, device)
            .map_err(|e| anyhow!("failed to load {}: {e}", path.display()))
    }
}

/// Loads `tokenizer.json`, or assembles a WordPiece tokenizer from
/// `vocab.txt` for older BERT snapshots.
pub fn load_tokenizer(snapshot: &Path, max_len: usize, lowercase: bool) -> Result<Tokenizer> {
    let tokenizer_path = snapshot.join("tokenizer.json");
    let mut tokenizer = if tokenizer_path.exists() {
        Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Tokenizer load failed ({}): {e}", tokenizer_path.display()))?
    } else {
        wordpiece_tokenizer(snapshot, lowercase)?
    };

    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_len,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("failed to configure truncation: {e}"))?;
    Ok(tokenizer)
}

fn wordpiece_tokenizer(snapshot: &Path, lowercase: bool) -> Result<Tokenizer> {
    let vocab = snapshot.join("vocab.txt");
    if !vocab.exists() {
        return Err(anyhow!(
            "neither tokenizer.json nor vocab.txt found under {}",
            snapshot.display()
        ));
    }

    let wordpiece = WordPiece::from_file(
        vocab
            .to_str()
            .ok_or_else(|| anyhow!("Invalid vocab path"))?,
    )
    .unk_token("[UNK]".to_string())
    .build()
    .map_err(|e| anyhow!("WordPiece tokenizer build error: {e}"))?;

    let mut tokenizer = Tokenizer::new(wordpiece);
    tokenizer.with_normalizer(Some(NormalizerWrapper::BertNormalizer(BertNormalizer::new(
        true, true, None, lowercase,
    ))));
    tokenizer.with_pre_tokenizer(Some(PreTokenizerWrapper::BertPreTokenizer(
        BertPreTokenizer,
    )));

    let cls = tokenizer
        .token_to_id("[CLS]")
        .ok_or_else(|| anyhow!("vocab.txt has no [CLS] token"))?;
    let sep = tokenizer
        .token_to_id("[SEP]")
        .ok_or_else(|| anyhow!("vocab.txt has no [SEP] token"))?;
    tokenizer.with_post_processor(Some(PostProcessorWrapper::Bert(BertProcessing::new(
        ("[SEP]".to_string(), sep),
        ("[CLS]".to_string(), cls),
    ))));

    Ok(tokenizer)
}

pub fn encode(tokenizer: &Tokenizer, text: &str) -> Result<Encoding> {
    let enc = tokenizer
        .encode(text, true)
        .map_err(|e| anyhow!("Tokenizer encode error: {e}"))?;
    if enc.get_ids().is_empty() {
        return Err(anyhow!("tokenizer produced no tokens"));
    }
    Ok(enc)
}

/// `[1, seq_len]` input ids plus matching zeroed token type ids.
pub fn input_tensors(enc: &Encoding, device: &Device) -> candle::Result<(Tensor, Tensor)> {
    let ids = Tensor::new(enc.get_ids(), device)?.unsqueeze(0)?;
    let token_type_ids = ids.zeros_like()?;
    Ok((ids, token_type_ids))
}

/// Parses `cpu`, `cuda` or `cuda:N`. Unknown values fall back to CPU.
pub fn build_device(preference: &str) -> Result<Device> {
    let trimmed = preference.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.is_empty() || lower == "cpu" {
        Ok(Device::Cpu)
    } else if lower.starts_with("cuda") || lower.starts_with("gpu") {
        let ordinal = trimmed
            .split(':')
            .nth(1)
            .and_then(|part| part.parse::<usize>().ok())
            .unwrap_or(0);
        Device::new_cuda(ordinal).map_err(|err| {
            anyhow!(
                "requested CUDA device {} but initialization failed ({err}). Build with the \
                 `cuda` feature and ensure CUDA libraries are available.",
                ordinal
            )
        })
    } else {
        warn!("unrecognized WEATHER_BOT_DEVICE value '{trimmed}', defaulting to cpu");
        Ok(Device::Cpu)
    }
}
