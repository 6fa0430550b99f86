use tracing::{debug, info};

use crate::classifier::IntentClassifier;
use crate::weather::WeatherSource;

pub const OFF_TOPIC_REPLY: &str = "I'm sorry, I can only provide information about the weather.";
pub const MISSING_CITY_REPLY: &str = "You need to tell me a city to check.";
pub const LOOKUP_FAILED_REPLY: &str = "Something went wrong.";

/// Answers weather questions, one utterance at a time.
///
/// Nothing is remembered between calls.
pub struct Chatbot<S> {
    classifier: IntentClassifier,
    source: S,
}

impl<S: WeatherSource> Chatbot<S> {
    pub fn new(classifier: IntentClassifier, source: S) -> Self {
        Self { classifier, source }
    }

    pub async fn respond(&self, utterance: &str) -> String {
        let classification = self.classifier.classify(utterance);

        if !classification.is_weather_intent {
            debug!(similarity = classification.similarity, "off-topic utterance");
            return OFF_TOPIC_REPLY.to_string();
        }

        let Some(city) = classification.city else {
            return MISSING_CITY_REPLY.to_string();
        };

        info!(%city, "looking up weather");
        match self.source.lookup(&city).await {
            Ok(summary) => summary,
            Err(_) => LOOKUP_FAILED_REPLY.to_string(),
        }
    }
}
