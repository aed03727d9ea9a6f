use serde::{Deserialize, Serialize};

use crate::WeatherError;

/// Normalized current conditions, as served to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// e.g. "28°C"
    #[serde(rename = "temp")]
    pub temperature: String,
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub last_updated: String,
}

/// Success body of the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherPayload {
    #[serde(flatten)]
    pub snapshot: WeatherSnapshot,
    pub cached: bool,
}

impl WeatherPayload {
    pub fn fresh(snapshot: WeatherSnapshot) -> Self {
        Self { snapshot, cached: false }
    }

    pub fn cached(snapshot: WeatherSnapshot) -> Self {
        Self { snapshot, cached: true }
    }
}

/// Failure body of the endpoint, sent with 503.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub message: String,
}

impl ErrorPayload {
    pub const ERROR: &'static str = "Unable to fetch weather data";
    pub const UNAVAILABLE: &'static str = "All weather services unavailable";

    pub fn new(message: impl Into<String>) -> Self {
        Self { error: Self::ERROR.to_string(), message: message.into() }
    }

    /// Payload for a request that no provider or cache could answer.
    pub fn from_error(err: &WeatherError) -> Self {
        Self::new(format!("{}: {err}", Self::UNAVAILABLE))
    }
}
