mod common;

use std::sync::Arc;

use common::{classifier, gpe, person, ScriptedModel, AT_HALF, HIGH, LOW};
use weather_bot::{
    classifier::{Classification, IntentClassifier},
    inference::{Entity, EntityLabel},
};

#[test]
fn below_threshold_is_rejected() {
    let classifier = classifier(Arc::new(ScriptedModel::new(LOW, vec![gpe("Paris")])));

    assert_eq!(
        classifier.classify("what is your name?"),
        Classification {
            is_weather_intent: false,
            city: None,
            needs_city: false,
            similarity: 0.0,
        }
    );
}

#[test]
fn at_threshold_is_accepted() {
    let classifier = classifier(Arc::new(ScriptedModel::new(AT_HALF, vec![gpe("Paris")])));
    assert_eq!(classifier.threshold(), 0.5);

    let result = classifier.classify("weather in Paris");
    assert!(result.is_weather_intent);
    assert_eq!(result.similarity, 0.5);
    assert_eq!(result.city.as_deref(), Some("Paris"));
}

#[test]
fn raised_threshold_rejects_the_same_score() {
    let classifier = classifier(Arc::new(ScriptedModel::new(AT_HALF, vec![gpe("Paris")])))
        .with_threshold(0.51);

    assert!(!classifier.classify("weather in Paris").is_weather_intent);
}

#[test]
fn utterance_is_lower_cased_before_embedding() {
    let model = Arc::new(ScriptedModel::new(HIGH, vec![]));
    let classifier = IntentClassifier::new(model.clone()).unwrap();

    classifier.classify("Is It HOT in Brooklyn?");
    assert_eq!(model.embedded(), vec!["is it hot in brooklyn?"]);
}

#[test]
fn missing_city_is_flagged() {
    let classifier = classifier(Arc::new(ScriptedModel::new(HIGH, vec![person("Alice")])));

    let result = classifier.classify("Tell me the weather?");
    assert!(result.is_weather_intent);
    assert!(result.needs_city);
    assert_eq!(result.city, None);
}

#[test]
fn blank_geo_entity_is_skipped() {
    let classifier = classifier(Arc::new(ScriptedModel::new(
        HIGH,
        vec![gpe("  "), gpe("Lisbon")],
    )));

    assert_eq!(
        classifier.classify("weather in Lisbon").city.as_deref(),
        Some("Lisbon")
    );
}

#[test]
fn first_geo_entity_is_capitalized() {
    let classifier = classifier(Arc::new(ScriptedModel::new(
        HIGH,
        vec![
            Entity::new("today", EntityLabel::Misc("DATE".into())),
            gpe("new york"),
            gpe("boston"),
        ],
    )));

    assert_eq!(
        classifier.classify("is it cold in new york or boston today").city.as_deref(),
        Some("New York")
    );
}

#[test]
fn entity_failure_means_no_city() {
    let classifier = classifier(Arc::new(
        ScriptedModel::new(HIGH, vec![gpe("Paris")]).failing_entities(),
    ));

    let result = classifier.classify("weather in Paris");
    assert!(result.is_weather_intent);
    assert!(result.needs_city);
}
