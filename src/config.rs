use tracing::warn;

pub const API_KEY_VAR: &str = "OPEN_WEATHER_BOT_API_KEY";
pub const BASE_URL_VAR: &str = "OPEN_WEATHER_BOT_BASE_URL";
pub const THRESHOLD_VAR: &str = "WEATHER_BOT_THRESHOLD";
pub const EMBED_MODEL_VAR: &str = "WEATHER_BOT_EMBED_MODEL";
pub const NER_MODEL_VAR: &str = "WEATHER_BOT_NER_MODEL";
pub const DEVICE_VAR: &str = "WEATHER_BOT_DEVICE";

pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";
pub const DEFAULT_THRESHOLD: f32 = 0.5;
pub const DEFAULT_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_NER_MODEL: &str = "dslim/bert-base-NER";

/// Process configuration, read once at startup.
///
/// A missing API key is not an error here: the weather lookup reports it on
/// each call and the bot keeps answering.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub threshold: f32,
    pub embed_model: String,
    pub ner_model: String,
    pub device: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            threshold: DEFAULT_THRESHOLD,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            ner_model: DEFAULT_NER_MODEL.to_string(),
            device: "cpu".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let threshold = match non_blank(THRESHOLD_VAR) {
            Some(raw) => match raw.trim().parse::<f32>() {
                Ok(value) if value.is_finite() => value,
                _ => {
                    warn!("ignoring invalid {THRESHOLD_VAR}='{raw}', using {DEFAULT_THRESHOLD}");
                    DEFAULT_THRESHOLD
                }
            },
            None => defaults.threshold,
        };

        Self {
            api_key: non_blank(API_KEY_VAR).map(|v| v.trim().to_string()),
            base_url: non_blank(BASE_URL_VAR)
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            threshold,
            embed_model: non_blank(EMBED_MODEL_VAR).unwrap_or(defaults.embed_model),
            ner_model: non_blank(NER_MODEL_VAR).unwrap_or(defaults.ner_model),
            device: non_blank(DEVICE_VAR).unwrap_or(defaults.device),
        }
    }
}
