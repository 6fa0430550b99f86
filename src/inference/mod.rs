pub mod bert;
pub mod embedder;
pub mod ner;

use anyhow::Result;

/// Sentence embedding produced by a [`LanguageModel`].
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticVector(Vec<f32>);

impl SemanticVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cosine similarity. Zero vectors score `0.0`.
    pub fn similarity(&self, other: &SemanticVector) -> f32 {
        cosine(&self.0, &other.0)
    }
}

impl From<Vec<f32>> for SemanticVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityLabel {
    /// City, region or country.
    GeoPolitical,
    Person,
    Organization,
    Misc(String),
}

impl EntityLabel {
    /// Maps a raw NER tag (without the `B-`/`I-` prefix) to a label.
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "LOC" | "GPE" => EntityLabel::GeoPolitical,
            "PER" | "PERSON" => EntityLabel::Person,
            "ORG" => EntityLabel::Organization,
            other => EntityLabel::Misc(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// What the chatbot needs from a pretrained language model.
pub trait LanguageModel: Send + Sync {
    fn embed(&self, text: &str) -> Result<SemanticVector>;

    /// Named entities in document order.
    fn entities(&self, text: &str) -> Result<Vec<Entity>>;
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }

    dot / (na.sqrt() * nb.sqrt()).max(1e-9)
}
