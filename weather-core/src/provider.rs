use crate::{
    Config, WeatherError, WeatherSnapshot,
    provider::{openweather::OpenWeatherProvider, wttr::WttrProvider, wttr_basic::WttrBasicProvider},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, header};
use std::{convert::TryFrom, fmt::Debug};

pub mod openweather;
pub mod wttr;
pub mod wttr_basic;

/// Revalidation hint sent with every upstream request. Matches the default
/// freshness window; the aggregator's own cache check is what actually gates.
const REVALIDATE_HINT: &str = "max-age=900";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeather,
    Wttr,
    WttrBasic,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "openweather",
            ProviderId::Wttr => "wttr",
            ProviderId::WttrBasic => "wttr-basic",
        }
    }

    /// All providers, in fallback order.
    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenWeather, ProviderId::Wttr, ProviderId::WttrBasic]
    }

    /// Whether the provider authenticates with an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenWeather => "https://api.openweathermap.org",
            ProviderId::Wttr | ProviderId::WttrBasic => "https://wttr.in",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ProviderId::OpenWeather),
            "wttr" => Ok(ProviderId::Wttr),
            "wttr-basic" => Ok(ProviderId::WttrBasic),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweather, wttr, wttr-basic."
            )),
        }
    }
}

/// A source of current conditions for the configured location.
///
/// Each implementation does its own parsing and normalization and must return
/// a complete snapshot, `last_updated` included (rendered from `now`).
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn current(&self, now: DateTime<Utc>) -> Result<WeatherSnapshot, WeatherError>;
}

/// Build the HTTP client shared by all providers.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("weather-core/", env!("CARGO_PKG_VERSION")));
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Construct every provider, in fallback order.
///
/// A missing OpenWeather key is not an error here; that provider fails at
/// request time and the chain moves on.
pub fn providers_from_config(config: &Config) -> anyhow::Result<Vec<Box<dyn WeatherProvider>>> {
    let http = http_client(config)?;

    for id in ProviderId::all().iter().filter(|id| id.requires_api_key()) {
        if !config.is_provider_configured(*id) {
            tracing::warn!(provider = %id, "no API key configured, provider will be skipped");
        }
    }

    let providers = ProviderId::all()
        .iter()
        .map(|id| -> Box<dyn WeatherProvider> {
            let base_url = config.provider_base_url(*id).trim_end_matches('/').to_string();
            match id {
                ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(
                    http.clone(),
                    base_url,
                    config.provider_api_key(*id).map(str::to_owned),
                    config.location.clone(),
                )),
                ProviderId::Wttr => Box::new(WttrProvider::new(
                    http.clone(),
                    base_url,
                    config.location.name.clone(),
                )),
                ProviderId::WttrBasic => Box::new(WttrBasicProvider::new(
                    http.clone(),
                    base_url,
                    config.location.name.clone(),
                )),
            }
        })
        .collect();

    Ok(providers)
}

/// Send a GET with the revalidation hint and fail on non-success status.
pub(crate) async fn send_checked(
    request: RequestBuilder,
    label: &str,
) -> Result<Response, WeatherError> {
    let res = request
        .header(header::CACHE_CONTROL, REVALIDATE_HINT)
        .send()
        .await
        .map_err(|e| WeatherError::from_reqwest(&format!("Failed to send request to {label}"), e))?;

    let status = res.status();
    if !status.is_success() {
        if let Ok(body) = res.text().await {
            tracing::debug!(provider = label, %status, body = %truncate_body(&body), "upstream error body");
        }
        return Err(WeatherError::transport(format!("{label} request failed with status {status}")));
    }

    Ok(res)
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
