pub mod transport;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;
use transport::WeatherTransport;

pub const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// Why a lookup produced no report. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("weather API key is not set")]
    MissingCredential,
    #[error("weather provider returned HTTP {0}")]
    HttpError(u16),
    #[error("unexpected response format")]
    UnexpectedFormat,
    #[error("response body is not valid JSON: {0}")]
    MalformedBody(String),
    #[error("request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub city: String,
    pub temperature_fahrenheit: i64,
    pub description: String,
}

impl WeatherReport {
    /// Reads `main.temp` and `weather[0].description` from a provider payload.
    /// Both must be present; the temperature is rounded half to even.
    pub fn from_payload(city: &str, payload: &Value) -> Result<Self, FailureReason> {
        let temp = payload
            .get("main")
            .and_then(|main| main.get("temp"))
            .and_then(Value::as_f64);
        let description = payload
            .get("weather")
            .and_then(|weather| weather.get(0))
            .and_then(|first| first.get("description"))
            .and_then(Value::as_str);

        match (temp, description) {
            (Some(temp), Some(description)) => Ok(Self {
                city: city.to_string(),
                temperature_fahrenheit: temp.round_ties_even() as i64,
                description: description.to_string(),
            }),
            _ => Err(FailureReason::UnexpectedFormat),
        }
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "In {}, the current weather is: {}F with {}",
            self.city, self.temperature_fahrenheit, self.description
        )
    }
}

/// Something that can summarize the current weather for a city.
pub trait WeatherSource: Send + Sync {
    fn lookup(&self, city: &str) -> impl Future<Output = Result<String, FailureReason>> + Send;
}

impl<S: WeatherSource> WeatherSource for Arc<S> {
    fn lookup(&self, city: &str) -> impl Future<Output = Result<String, FailureReason>> + Send {
        (**self).lookup(city)
    }
}

/// Current-weather client for the OpenWeatherMap API.
pub struct WeatherLookup<T> {
    transport: T,
    api_key: Option<String>,
    base_url: String,
}

impl<T: WeatherTransport> WeatherLookup<T> {
    pub fn new(transport: T, settings: &Settings) -> Self {
        Self {
            transport,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch(&self, city: &str) -> Result<WeatherReport, FailureReason> {
        let result = self.try_fetch(city).await;
        if let Err(reason) = &result {
            warn!(city, "[!] weather lookup failed: {reason}");
        }
        result
    }

    async fn try_fetch(&self, city: &str) -> Result<WeatherReport, FailureReason> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FailureReason::MissingCredential)?;

        let url = format!("{}{}", self.base_url, CURRENT_WEATHER_PATH);
        let query = [("q", city), ("units", "imperial"), ("appid", api_key)];
        debug!(city, %url, "requesting current weather");

        let reply = self
            .transport
            .get(&url, &query)
            .await
            .map_err(|err| FailureReason::Transport(err.to_string()))?;

        if reply.status != 200 {
            return Err(FailureReason::HttpError(reply.status));
        }

        let payload: Value = serde_json::from_str(&reply.body)
            .map_err(|err| FailureReason::MalformedBody(err.to_string()))?;
        WeatherReport::from_payload(city, &payload)
    }
}

impl<T: WeatherTransport> WeatherSource for WeatherLookup<T> {
    async fn lookup(&self, city: &str) -> Result<String, FailureReason> {
        self.fetch(city).await.map(|report| report.to_string())
    }
}
