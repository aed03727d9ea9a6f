use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::{
    WeatherError, WeatherSnapshot,
    format::format_last_updated,
    provider::{ProviderId, send_checked},
};

use super::WeatherProvider;

/// Placeholder for fields the one-line format left out.
pub const NOT_AVAILABLE: &str = "N/A";

/// Tertiary provider: wttr.in one-line `temperature|condition|humidity|wind`.
#[derive(Debug, Clone)]
pub struct WttrBasicProvider {
    http: Client,
    base_url: String,
    location: String,
}

impl WttrBasicProvider {
    pub fn new(http: Client, base_url: String, location: String) -> Self {
        Self { http, base_url, location }
    }
}

/// Split the pipe-delimited line into a snapshot.
fn parse_line(
    line: &str,
    location: &str,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let mut fields = line.split('|');

    let temperature = fields.next().unwrap_or_default().replacen('+', "", 1).trim().to_string();
    let condition = fields
        .next()
        .map(|c| c.trim().to_string())
        .ok_or_else(|| WeatherError::format("Basic wttr.in response has no condition field"))?;

    let or_placeholder = |field: Option<&str>| {
        field
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(NOT_AVAILABLE)
            .to_string()
    };
    let humidity = or_placeholder(fields.next());
    let wind_speed = or_placeholder(fields.next());

    Ok(WeatherSnapshot {
        temperature,
        condition,
        feels_like: None,
        humidity: Some(humidity),
        wind_speed: Some(wind_speed),
        location: Some(location.to_string()),
        last_updated: format_last_updated(now),
    })
}

#[async_trait]
impl WeatherProvider for WttrBasicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WttrBasic
    }

    async fn current(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError> {
        let url = format!("{}/{}", self.base_url, self.location);
        let request = self.http.get(url).query(&[("format", "%t|%C|%h|%w")]);

        let res = send_checked(request, "Basic wttr.in").await?;
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::from_reqwest("Failed to read basic wttr.in response body", e))?;

        parse_line(&body, &self.location, now)
    }
}
