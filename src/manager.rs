use anyhow::{Context, Result};

use crate::{
    config::Settings,
    inference::{
        bert::{build_device, resolve_snapshot},
        embedder::BertEmbedder,
        ner::BertNer,
        Entity, LanguageModel, SemanticVector,
    },
};

/// The embedding model and the NER tagger, loaded once and shared read-only.
pub struct ModelManager {
    pub embedder: BertEmbedder,
    pub ner: BertNer,
}

impl ModelManager {
    pub fn load(settings: &Settings) -> Result<Self> {
        let device = build_device(&settings.device)?;

        let embed_dir = resolve_snapshot(&settings.embed_model)
            .with_context(|| format!("failed to resolve {}", settings.embed_model))?;
        let ner_dir = resolve_snapshot(&settings.ner_model)
            .with_context(|| format!("failed to resolve {}", settings.ner_model))?;

        let embedder = BertEmbedder::load(&embed_dir, device.clone())?;
        let ner = BertNer::load(&ner_dir, device)?;

        Ok(Self { embedder, ner })
    }
}

impl LanguageModel for ModelManager {
    fn embed(&self, text: &str) -> Result<SemanticVector> {
        self.embedder.embed(text).map(SemanticVector::from)
    }

    fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        self.ner.entities(text)
    }
}
