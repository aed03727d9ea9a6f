use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    LocationConfig, WeatherError, WeatherSnapshot,
    format::{
        format_humidity, format_last_updated, format_number, format_temperature, format_wind_kmh,
        round_half_up,
    },
    provider::{ProviderId, send_checked},
};

use super::WeatherProvider;

/// Primary provider: OpenWeather current conditions, metric units.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    location: LocationConfig,
}

impl OpenWeatherProvider {
    pub fn new(
        http: Client,
        base_url: String,
        api_key: Option<String>,
        location: LocationConfig,
    ) -> Self {
        Self { http, base_url, api_key, location }
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_snapshot(self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or_else(|| WeatherError::format("OpenWeather response contained no weather entry"))?;

        Ok(WeatherSnapshot {
            temperature: format_temperature(round_half_up(self.main.temp)),
            condition,
            feels_like: Some(format_temperature(round_half_up(self.main.feels_like))),
            humidity: Some(format_humidity(format_number(self.main.humidity))),
            wind_speed: Some(format_wind_kmh(round_half_up(self.wind.speed * 3.6))),
            location: Some(self.name),
            last_updated: format_last_updated(now),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn current(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherError::configuration("No OpenWeather API key configured"))?;

        let url = format!("{}/data/2.5/weather", self.base_url);
        let request = self.http.get(url).query(&[
            ("q", self.location.query.as_str()),
            ("appid", api_key),
            ("units", "metric"),
            ("lang", self.location.language.as_str()),
        ]);

        let res = send_checked(request, "OpenWeather").await?;
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::from_reqwest("Failed to read OpenWeather response body", e))?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::format(format!("Failed to parse OpenWeather JSON: {e}")))?;

        parsed.into_snapshot(now)
    }
}
