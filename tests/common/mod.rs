#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use weather_bot::{
    classifier::{IntentClassifier, REFERENCE_PHRASE},
    config::Settings,
    inference::{Entity, EntityLabel, LanguageModel, SemanticVector},
    weather::{
        transport::{TransportError, TransportReply, WeatherTransport},
        FailureReason, WeatherSource,
    },
};

/// Similarity 1.0 against the reference vector.
pub const HIGH: [f32; 4] = [1.0, 0.0, 0.0, 0.0];
/// Similarity exactly 0.5.
pub const AT_HALF: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Similarity 0.0.
pub const LOW: [f32; 4] = [0.0, 1.0, 0.0, 0.0];

/// Language model double: the reference phrase embeds to `HIGH`, everything
/// else to a fixed vector, and every text yields the same entities.
pub struct ScriptedModel {
    utterance_vector: Vec<f32>,
    entities: Vec<Entity>,
    fail_entities: bool,
    embedded: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(utterance_vector: [f32; 4], entities: Vec<Entity>) -> Self {
        Self {
            utterance_vector: utterance_vector.to_vec(),
            entities,
            fail_entities: false,
            embedded: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_entities(mut self) -> Self {
        self.fail_entities = true;
        self
    }

    pub fn embedded(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }
}

impl LanguageModel for ScriptedModel {
    fn embed(&self, text: &str) -> Result<SemanticVector> {
        if text == REFERENCE_PHRASE {
            return Ok(SemanticVector::new(HIGH.to_vec()));
        }
        self.embedded.lock().unwrap().push(text.to_string());
        Ok(SemanticVector::new(self.utterance_vector.clone()))
    }

    fn entities(&self, _text: &str) -> Result<Vec<Entity>> {
        if self.fail_entities {
            return Err(anyhow!("tagger unavailable"));
        }
        Ok(self.entities.clone())
    }
}

pub fn gpe(text: &str) -> Entity {
    Entity::new(text, EntityLabel::GeoPolitical)
}

pub fn person(text: &str) -> Entity {
    Entity::new(text, EntityLabel::Person)
}

pub fn classifier(model: Arc<ScriptedModel>) -> IntentClassifier {
    IntentClassifier::new(model).expect("reference phrase embeds")
}

/// HTTP double that returns one canned reply and records every request.
pub struct ScriptedTransport {
    reply: Result<TransportReply, String>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: Ok(TransportReply::new(status, body)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl WeatherTransport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<TransportReply, TransportError> {
        self.requests.lock().unwrap().push((
            url.to_string(),
            query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self.reply.clone().map_err(TransportError)
    }
}

/// Weather source double that answers every city the same way.
pub struct FixedSource {
    reply: Result<String, FailureReason>,
    cities: Mutex<Vec<String>>,
}

impl FixedSource {
    pub fn ok(summary: &str) -> Self {
        Self {
            reply: Ok(summary.to_string()),
            cities: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: FailureReason) -> Self {
        Self {
            reply: Err(reason),
            cities: Mutex::new(Vec::new()),
        }
    }

    pub fn cities(&self) -> Vec<String> {
        self.cities.lock().unwrap().clone()
    }
}

impl WeatherSource for FixedSource {
    async fn lookup(&self, city: &str) -> Result<String, FailureReason> {
        self.cities.lock().unwrap().push(city.to_string());
        self.reply.clone()
    }
}

pub fn settings_with_key(key: &str) -> Settings {
    Settings {
        api_key: Some(key.to_string()),
        base_url: "http://weather.test".to_string(),
        ..Settings::default()
    }
}

pub const CLEAR_SKY: &str = r#"{"main": {"temp": 70}, "weather": [{"description": "clear sky"}]}"#;
