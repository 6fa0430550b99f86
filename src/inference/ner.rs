use anyhow::{anyhow, Context, Result};
use candle::{DType, Device, Module, D};
use candle_nn::Linear;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tokenizers::{Encoding, Tokenizer};
use tracing::info;

use super::bert::{
    build_var_builder, encode, find_model_weights, input_tensors, load_json, load_tokenizer,
};
use super::{Entity, EntityLabel};

#[derive(Deserialize)]
struct LabelConfig {
    id2label: HashMap<String, String>,
}

/// Token-classification head on top of a BERT encoder, emitting BIO tags.
pub struct BertNer {
    model: BertModel,
    classifier: Linear,
    tokenizer: Tokenizer,
    device: Device,
    labels: Vec<String>,
}

impl BertNer {
    pub fn load(snapshot: &Path, device: Device) -> Result<Self> {
        info!("📁 NER snapshot: {}", snapshot.display());

        let config: BertConfig = load_json(snapshot, "config.json")?;
        let labels = ordered_labels(load_json::<LabelConfig>(snapshot, "config.json")?)?;
        let tokenizer = load_tokenizer(snapshot, config.max_position_embeddings, false)?;

        let weights = find_model_weights(snapshot)
            .ok_or_else(|| anyhow!("no model weights found under {}", snapshot.display()))?;
        let vb = build_var_builder(&weights, DType::F32, &device)?;
        let model = BertModel::load(vb.clone(), &config).context("failed to load NER encoder")?;
        let classifier = candle_nn::linear(config.hidden_size, labels.len(), vb.pp("classifier"))
            .context("failed to load NER classifier head")?;

        info!("🚀 NER model loaded on {device:?} ({} labels)", labels.len());

        Ok(Self {
            model,
            classifier,
            tokenizer,
            device,
            labels,
        })
    }

    pub fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        let enc = encode(&self.tokenizer, text)?;
        let (input, token_type_ids) = input_tensors(&enc, &self.device)?;

        let hidden = self
            .model
            .forward(&input, &token_type_ids, None)
            .context("NER forward pass failed")?;
        let tags = self
            .classifier
            .forward(&hidden)?
            .squeeze(0)?
            .argmax(D::Minus1)?
            .to_vec1::<u32>()?;

        let words = tagged_words(&enc, &tags, &self.labels);
        Ok(group_entities(text, &words))
    }
}

fn ordered_labels(config: LabelConfig) -> Result<Vec<String>> {
    let mut indexed = config
        .id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|idx| (idx, label))
                .map_err(|_| anyhow!("non-numeric id2label key '{id}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(idx, _)| *idx);

    if indexed.is_empty() {
        return Err(anyhow!("config.json has an empty id2label map"));
    }
    if indexed.iter().enumerate().any(|(pos, (idx, _))| pos != *idx) {
        return Err(anyhow!("id2label indices are not contiguous"));
    }
    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// A word with the tag predicted for its first sub-token.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedWord {
    pub start: usize,
    pub end: usize,
    pub tag: String,
}

fn tagged_words(enc: &Encoding, tags: &[u32], labels: &[String]) -> Vec<TaggedWord> {
    let mut words: Vec<TaggedWord> = Vec::new();
    let mut current_word = None;

    for ((word_id, &(start, end)), &tag) in enc
        .get_word_ids()
        .iter()
        .zip(enc.get_offsets())
        .zip(tags)
    {
        let Some(word_id) = *word_id else {
            continue;
        };
        if current_word == Some(word_id) {
            if let Some(last) = words.last_mut() {
                last.end = end;
            }
            continue;
        }
        let tag = labels
            .get(tag as usize)
            .cloned()
            .unwrap_or_else(|| "O".to_string());
        words.push(TaggedWord { start, end, tag });
        current_word = Some(word_id);
    }
    words
}

/// Merges BIO-tagged words into entity spans over `text`.
pub fn group_entities(text: &str, words: &[TaggedWord]) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut open: Option<(usize, usize, String)> = None;

    for word in words {
        let (prefix, kind) = match word.tag.split_once('-') {
            Some((prefix, kind)) => (prefix, kind),
            None => ("O", ""),
        };

        let continues = prefix == "I" && matches!(&open, Some((_, _, k)) if k == kind);
        if continues {
            if let Some((_, end, _)) = open.as_mut() {
                *end = word.end;
            }
            continue;
        }

        if let Some(span) = open.take() {
            push_span(text, span, &mut entities);
        }
        if prefix == "B" || prefix == "I" {
            open = Some((word.start, word.end, kind.to_string()));
        }
    }
    if let Some(span) = open {
        push_span(text, span, &mut entities);
    }
    entities
}

fn push_span(text: &str, (start, end, kind): (usize, usize, String), out: &mut Vec<Entity>) {
    if let Some(span) = text.get(start..end) {
        out.push(Entity::new(span, EntityLabel::from_tag(&kind)));
    }
}
