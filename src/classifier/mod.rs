pub mod intent;

pub use intent::{Classification, IntentClassifier, REFERENCE_PHRASE};
