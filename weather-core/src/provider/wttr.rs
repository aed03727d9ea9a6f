use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, header};
use serde::Deserialize;

use crate::{
    WeatherError, WeatherSnapshot,
    format::{format_humidity, format_last_updated, format_temperature, format_wind_kmh},
    provider::{ProviderId, send_checked},
};

use super::WeatherProvider;

/// Secondary provider: wttr.in structured JSON (`format=j1`).
#[derive(Debug, Clone)]
pub struct WttrProvider {
    http: Client,
    base_url: String,
    location: String,
}

impl WttrProvider {
    pub fn new(http: Client, base_url: String, location: String) -> Self {
        Self { http, base_url, location }
    }
}

#[derive(Debug, Deserialize)]
struct WttrValue {
    value: String,
}

// Field names as wttr.in spells them.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct WttrCurrentCondition {
    temp_C: String,
    FeelsLikeC: String,
    humidity: String,
    windspeedKmph: String,
    weatherDesc: Vec<WttrValue>,
}

#[derive(Debug, Deserialize)]
struct WttrResponse {
    #[serde(default)]
    current_condition: Vec<WttrCurrentCondition>,
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Wttr
    }

    async fn current(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/{}", self.base_url, self.location);
        let request = self.http.get(url).query(&[("format", "j1")]);

        let res = send_checked(request, "wttr.in").await?;

        let is_json = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        if !is_json {
            return Err(WeatherError::format("Invalid response from wttr.in: not JSON"));
        }

        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::from_reqwest("Failed to read wttr.in response body", e))?;

        let parsed: WttrResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::format(format!("Invalid weather data format: {e}")))?;

        let current = parsed
            .current_condition
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::format("Invalid weather data format: no current_condition"))?;

        let condition = current
            .weatherDesc
            .into_iter()
            .next()
            .map(|d| d.value)
            .ok_or_else(|| WeatherError::format("Invalid weather data format: no weatherDesc"))?;

        Ok(WeatherSnapshot {
            temperature: format_temperature(&current.temp_C),
            condition,
            feels_like: Some(format_temperature(&current.FeelsLikeC)),
            humidity: Some(format_humidity(&current.humidity)),
            wind_speed: Some(format_wind_kmh(&current.windspeedKmph)),
            location: Some(self.location.clone()),
            last_updated: format_last_updated(now),
        })
    }
}
