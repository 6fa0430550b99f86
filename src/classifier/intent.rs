use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::DEFAULT_THRESHOLD;
use crate::inference::{EntityLabel, LanguageModel, SemanticVector};

pub const REFERENCE_PHRASE: &str = "Current temperature and weather description in a city";

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub is_weather_intent: bool,
    pub city: Option<String>,
    pub needs_city: bool,
    pub similarity: f32,
}

impl Classification {
    fn rejected(similarity: f32) -> Self {
        Self {
            is_weather_intent: false,
            city: None,
            needs_city: false,
            similarity,
        }
    }
}

/// Decides whether an utterance asks about the weather and which city it
/// names.
///
/// The boundary is inclusive: a similarity equal to the threshold counts as a
/// weather question.
pub struct IntentClassifier {
    model: Arc<dyn LanguageModel>,
    reference: SemanticVector,
    threshold: f32,
}

impl IntentClassifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Result<Self> {
        let reference = model
            .embed(REFERENCE_PHRASE)
            .context("failed to embed the reference phrase")?;
        Ok(Self {
            model,
            reference,
            threshold: DEFAULT_THRESHOLD,
        })
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn classify(&self, utterance: &str) -> Classification {
        let similarity = match self.model.embed(&utterance.to_lowercase()) {
            Ok(vector) => self.reference.similarity(&vector),
            Err(err) => {
                warn!("embedding failed, treating utterance as off-topic: {err:#}");
                return Classification::rejected(0.0);
            }
        };
        debug!(similarity, threshold = self.threshold, "intent similarity");

        if similarity < self.threshold {
            return Classification::rejected(similarity);
        }

        let entities = self.model.entities(utterance).unwrap_or_else(|err| {
            warn!("entity extraction failed: {err:#}");
            Vec::new()
        });

        let city = entities
            .iter()
            .find(|ent| ent.label == EntityLabel::GeoPolitical && !ent.text.trim().is_empty())
            .map(|ent| capitalize_words(&ent.text));
        debug!(?city, "city entity");

        Classification {
            is_weather_intent: true,
            needs_city: city.is_none(),
            city,
            similarity,
        }
    }
}

/// Upper-cases the first letter of every word and keeps the rest as written.
pub fn capitalize_words(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
